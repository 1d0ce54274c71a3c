// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jason Ish

//! Single-line editor state for the send prompt.
//!
//! Pure key handling with no terminal I/O, so a pending read can be dropped
//! and resumed without losing what the user typed.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthStr;

use crate::completion::CompletionState;
use crate::history::InputHistory;
use crate::roster::Index;

#[derive(Debug, PartialEq, Eq)]
pub(super) enum EditOutcome {
    /// State changed; redraw the prompt.
    Redraw,
    /// Nothing visible changed.
    Unchanged,
    Submit(String),
    Interrupt,
}

#[derive(Default)]
pub(super) struct LineEditor {
    buffer: String,
    /// Byte offset into `buffer`, always on a char boundary.
    cursor: usize,
    history: InputHistory,
    completion: CompletionState,
}

impl LineEditor {
    pub(super) fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Display columns before the cursor.
    pub(super) fn cursor_col(&self) -> usize {
        self.buffer[..self.cursor].width()
    }

    pub(super) fn menu(&self) -> (Vec<String>, usize) {
        (self.completion.labels(), self.completion.index)
    }

    pub(super) fn handle_key(&mut self, key: KeyEvent, index: &Index) -> EditOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl {
            match key.code {
                KeyCode::Char('c') => {
                    self.reset();
                    return EditOutcome::Interrupt;
                }
                KeyCode::Char('d') if self.buffer.is_empty() => return EditOutcome::Interrupt,
                KeyCode::Char('d') => self.delete_forward(),
                KeyCode::Char('a') => self.cursor = 0,
                KeyCode::Char('e') => self.cursor = self.buffer.len(),
                KeyCode::Char('u') => {
                    self.buffer.drain(..self.cursor);
                    self.cursor = 0;
                }
                KeyCode::Char('k') => self.buffer.truncate(self.cursor),
                KeyCode::Char('w') => self.delete_prev_word(),
                _ => return EditOutcome::Unchanged,
            }
            self.completion.clear();
            return EditOutcome::Redraw;
        }

        if self.completion.is_active() {
            match key.code {
                KeyCode::Tab | KeyCode::Down => {
                    self.completion.move_selection(1);
                    return EditOutcome::Redraw;
                }
                KeyCode::BackTab | KeyCode::Up => {
                    self.completion.move_selection(-1);
                    return EditOutcome::Redraw;
                }
                KeyCode::Enter => {
                    self.apply_completion();
                    return EditOutcome::Redraw;
                }
                KeyCode::Esc => {
                    self.completion.clear();
                    return EditOutcome::Redraw;
                }
                _ => {}
            }
        }

        match key.code {
            KeyCode::Enter => {
                if self.buffer.trim().is_empty() {
                    return EditOutcome::Unchanged;
                }
                let line = std::mem::take(&mut self.buffer);
                self.history.add(&line);
                self.reset();
                return EditOutcome::Submit(line);
            }
            KeyCode::Tab => {
                self.completion.init(&self.buffer[..self.cursor], index);
                if self.completion.matches.len() == 1 {
                    self.apply_completion();
                }
                return EditOutcome::Redraw;
            }
            KeyCode::Char(c) => {
                self.buffer.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                self.refresh_completion(index);
                return EditOutcome::Redraw;
            }
            KeyCode::Backspace => {
                self.delete_backward();
                self.refresh_completion(index);
                return EditOutcome::Redraw;
            }
            KeyCode::Delete => self.delete_forward(),
            KeyCode::Left => self.cursor = self.prev_boundary(),
            KeyCode::Right => self.cursor = self.next_boundary(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Up => {
                let Some(entry) = self.history.previous(&self.buffer).map(str::to_string) else {
                    return EditOutcome::Unchanged;
                };
                self.set_buffer(entry);
            }
            KeyCode::Down => {
                let Some(entry) = self.history.next().map(str::to_string) else {
                    return EditOutcome::Unchanged;
                };
                self.set_buffer(entry);
            }
            _ => return EditOutcome::Unchanged,
        }
        self.completion.clear();
        EditOutcome::Redraw
    }

    /// Insert pasted text at the cursor. Line breaks become spaces.
    pub(super) fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", " ").replace(['\r', '\n'], " ");
        self.buffer.insert_str(self.cursor, &text);
        self.cursor += text.len();
        self.completion.clear();
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.completion.clear();
    }

    fn set_buffer(&mut self, text: String) {
        self.cursor = text.len();
        self.buffer = text;
    }

    /// Keep an open menu in sync with what was typed.
    fn refresh_completion(&mut self, index: &Index) {
        if self.completion.is_active() {
            self.completion.init(&self.buffer[..self.cursor], index);
        }
    }

    fn apply_completion(&mut self) {
        if let Some(candidate) = self.completion.current() {
            let (line, cursor) = candidate.apply(&self.buffer);
            self.buffer = line;
            self.cursor = cursor;
        }
        self.completion.clear();
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.cursor)
    }

    fn delete_backward(&mut self) {
        let start = self.prev_boundary();
        self.buffer.drain(start..self.cursor);
        self.cursor = start;
    }

    fn delete_forward(&mut self) {
        let end = self.next_boundary();
        self.buffer.drain(self.cursor..end);
    }

    fn delete_prev_word(&mut self) {
        let before = &self.buffer[..self.cursor];
        let trimmed = before.trim_end();
        let start = trimmed
            .rfind(char::is_whitespace)
            .map(|i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        self.buffer.drain(start..self.cursor);
        self.cursor = start;
    }
}
