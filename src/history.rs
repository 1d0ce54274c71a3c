// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! In-memory input history for the send prompt. Nothing is persisted.

const MAX_HISTORY: usize = 1000;

#[derive(Debug)]
pub(crate) struct InputHistory {
    entries: Vec<String>,
    max_len: usize,
    /// Position while browsing; `None` when editing a fresh line.
    cursor: Option<usize>,
    /// The in-progress line saved when browsing starts.
    draft: String,
}

impl InputHistory {
    pub(crate) fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    pub(crate) fn with_capacity(max_len: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_len: max_len.max(1),
            cursor: None,
            draft: String::new(),
        }
    }

    /// Record a submitted line. Blank lines and immediate repeats are skipped.
    pub(crate) fn add(&mut self, line: &str) -> bool {
        self.cursor = None;
        self.draft.clear();

        if line.trim().is_empty() {
            return false;
        }
        if let Some(last) = self.entries.last()
            && last == line
        {
            return false;
        }

        self.entries.push(line.to_string());
        if self.entries.len() > self.max_len {
            self.entries.remove(0);
        }
        true
    }

    /// Step to an older entry. `current` is the line being edited, saved as
    /// the draft when browsing starts.
    pub(crate) fn previous(&mut self, current: &str) -> Option<&str> {
        let next = match self.cursor {
            None if self.entries.is_empty() => return None,
            None => {
                self.draft = current.to_string();
                self.entries.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.cursor = Some(next);
        self.entries.get(next).map(String::as_str)
    }

    /// Step to a newer entry, ending at the saved draft.
    pub(crate) fn next(&mut self) -> Option<&str> {
        let i = self.cursor?;
        if i + 1 < self.entries.len() {
            self.cursor = Some(i + 1);
            self.entries.get(i + 1).map(String::as_str)
        } else {
            self.cursor = None;
            Some(&self.draft)
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_skips_blank_and_dups() {
        let mut history = InputHistory::new();
        assert!(history.add("one"));
        assert!(!history.add("one"));
        assert!(!history.add("   "));
        assert!(history.add("two"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_capacity() {
        let mut history = InputHistory::with_capacity(2);
        history.add("a");
        history.add("b");
        history.add("c");
        assert_eq!(history.previous(""), Some("c"));
        assert_eq!(history.previous(""), Some("b"));
        assert_eq!(history.previous(""), Some("b"));
    }

    #[test]
    fn test_browse_restores_draft() {
        let mut history = InputHistory::new();
        history.add("first");
        history.add("second");

        assert_eq!(history.previous("typing"), Some("second"));
        assert_eq!(history.previous("second"), Some("first"));
        assert_eq!(history.next(), Some("second"));
        assert_eq!(history.next(), Some("typing"));
        assert_eq!(history.next(), None);
    }

    #[test]
    fn test_empty_history() {
        let mut history = InputHistory::new();
        assert_eq!(history.previous("x"), None);
        assert_eq!(history.next(), None);
    }
}
