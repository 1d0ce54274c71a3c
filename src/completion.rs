// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Prompt completion for handles and message ids.

use std::ops::Range;
use std::slice;

use crate::commands::REPLY_KEYWORD;
use crate::model::MessageId;
use crate::roster::Index;

/// A replacement for part of the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub replacement: String,
    /// Byte range of the input that `replacement` replaces.
    pub span: Range<usize>,
}

impl Candidate {
    /// Apply to `line`, returning the new line and the byte offset just past
    /// the inserted text.
    pub(crate) fn apply(&self, line: &str) -> (String, usize) {
        let mut out = String::with_capacity(line.len() + self.replacement.len());
        out.push_str(&line[..self.span.start]);
        out.push_str(&self.replacement);
        let cursor = out.len();
        out.push_str(&line[self.span.end..]);
        (out, cursor)
    }
}

/// Lazy candidate sequence. Holds no state beyond one pass.
pub(crate) enum Candidates<'a> {
    Handles {
        handles: slice::Iter<'a, String>,
        needle: &'a str,
        span: Range<usize>,
    },
    MessageIds {
        ids: slice::Iter<'a, MessageId>,
        needle: &'a str,
        span: Range<usize>,
    },
    Empty,
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        match self {
            Candidates::Handles {
                handles,
                needle,
                span,
            } => handles
                .find(|h| h.starts_with(*needle))
                .map(|h| Candidate {
                    replacement: h.clone(),
                    span: span.clone(),
                }),
            Candidates::MessageIds { ids, needle, span } => ids.find_map(|id| {
                let text = id.to_string();
                text.starts_with(*needle).then(|| Candidate {
                    replacement: text,
                    span: span.clone(),
                })
            }),
            Candidates::Empty => None,
        }
    }
}

/// Completion candidates for `prefix`, the input line up to the cursor.
///
/// `@` completes participant handles, `/r ` completes message ids, and
/// nothing else completes.
pub(crate) fn candidates<'a>(prefix: &'a str, index: &'a Index) -> Candidates<'a> {
    if let Some(needle) = prefix.strip_prefix('@') {
        return Candidates::Handles {
            handles: index.handles().iter(),
            needle,
            span: 1..prefix.len(),
        };
    }

    if let Some(needle) = prefix
        .strip_prefix(REPLY_KEYWORD)
        .and_then(|rest| rest.strip_prefix(' '))
    {
        return Candidates::MessageIds {
            ids: index.message_ids().iter(),
            needle,
            span: REPLY_KEYWORD.len() + 1..prefix.len(),
        };
    }

    Candidates::Empty
}

/// Completion menu state for the prompt.
#[derive(Debug, Default)]
pub(crate) struct CompletionState {
    pub(crate) matches: Vec<Candidate>,
    pub(crate) index: usize,
}

impl CompletionState {
    pub(crate) fn is_active(&self) -> bool {
        !self.matches.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.matches.clear();
        self.index = 0;
    }

    /// Recompute matches for `prefix`.
    pub(crate) fn init(&mut self, prefix: &str, index: &Index) {
        self.matches = candidates(prefix, index).collect();
        self.index = 0;
    }

    pub(crate) fn current(&self) -> Option<&Candidate> {
        self.matches.get(self.index)
    }

    /// Move selection by delta (positive = forward, negative = backward)
    pub(crate) fn move_selection(&mut self, delta: isize) {
        if self.matches.is_empty() {
            return;
        }
        let len = self.matches.len() as isize;
        let new_index = (self.index as isize + delta).rem_euclid(len);
        self.index = new_index as usize;
    }

    /// Labels for the popup menu.
    pub(crate) fn labels(&self) -> Vec<String> {
        self.matches.iter().map(|c| c.replacement.clone()).collect()
    }
}
