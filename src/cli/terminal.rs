// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jason Ish

//! Terminal management for CLI mode.
//!
//! Output printed while the send prompt is visible goes through
//! [`print_above`], which clears the prompt and its completion menu, writes
//! the text, and draws the prompt again with the user's partial input. All
//! writes happen under one output lock so lines never interleave.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, OnceLock};

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::terminal::{self, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate};
use unicode_width::UnicodeWidthStr;

use super::completion_menu;

/// Snapshot of what the prompt area shows.
struct PromptState {
    visible: bool,
    prompt: String,
    buffer: String,
    /// Display columns of the buffer before the cursor.
    cursor_col: usize,
    menu: Vec<String>,
    selected: usize,
    /// Rows between the first prompt row and the cursor, as last drawn.
    cursor_row: u16,
}

impl PromptState {
    const fn new() -> Self {
        Self {
            visible: false,
            prompt: String::new(),
            buffer: String::new(),
            cursor_col: 0,
            menu: Vec::new(),
            selected: 0,
            cursor_row: 0,
        }
    }
}

static PROMPT_STATE: Mutex<PromptState> = Mutex::new(PromptState::new());
static OUTPUT_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn output_lock() -> &'static Mutex<()> {
    OUTPUT_LOCK.get_or_init(|| Mutex::new(()))
}

pub(crate) fn lock_output() -> MutexGuard<'static, ()> {
    match output_lock().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn prompt_state() -> MutexGuard<'static, PromptState> {
    match PROMPT_STATE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(crate) fn term_width() -> u16 {
    terminal::size().map(|(w, _)| w).unwrap_or(80).max(1)
}

/// Convert bare `\n` to `\r\n`. Raw mode does not return to column 0 on LF.
pub(crate) fn normalize_newlines(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    let mut prev_cr = false;

    for ch in text.chars() {
        if ch == '\n' {
            if !prev_cr {
                output.push('\r');
            }
            output.push('\n');
        } else {
            output.push(ch);
        }
        prev_cr = ch == '\r';
    }

    output
}

/// Row and column of display offset `offset` on a terminal `width` wide.
fn wrap_position(offset: usize, width: u16) -> (u16, u16) {
    let width = width.max(1) as usize;
    ((offset / width) as u16, (offset % width) as u16)
}

/// Run `f` inside a synchronized update so the terminal paints once.
fn sync_update<F>(f: F) -> io::Result<()>
where
    F: FnOnce(&mut io::Stdout) -> io::Result<()>,
{
    let mut stdout = io::stdout();
    queue!(stdout, BeginSynchronizedUpdate)?;
    let result = f(&mut stdout);
    queue!(stdout, EndSynchronizedUpdate)?;
    stdout.flush()?;
    result
}

/// Move to the first prompt row and clear everything below.
fn clear_prompt_area(stdout: &mut io::Stdout, state: &PromptState) -> io::Result<()> {
    if state.cursor_row > 0 {
        queue!(stdout, MoveUp(state.cursor_row))?;
    }
    queue!(stdout, MoveToColumn(0), Clear(ClearType::FromCursorDown))
}

/// Draw prompt, buffer and menu starting at the cursor row, then park the
/// cursor at the edit position.
fn draw_prompt_area(stdout: &mut io::Stdout, state: &mut PromptState) -> io::Result<()> {
    let width = term_width();
    let prompt_width = state.prompt.width();
    let line_width = prompt_width + state.buffer.width();

    queue!(stdout, MoveToColumn(0))?;
    write!(stdout, "{}{}", state.prompt, state.buffer)?;

    // Row the terminal cursor ends on after writing the line.
    let mut end_row = wrap_position(line_width.saturating_sub(1), width).0;
    if line_width > 0 && line_width % width as usize == 0 {
        // Exactly full: force the pending wrap so the next row starts clean.
        write!(stdout, "\r\n")?;
        end_row += 1;
    }

    end_row += completion_menu::render(stdout, &state.menu, state.selected)?;

    let (row, col) = wrap_position(prompt_width + state.cursor_col, width);
    let up = end_row.saturating_sub(row);
    if up > 0 {
        queue!(stdout, MoveUp(up))?;
    }
    queue!(stdout, MoveToColumn(col))?;
    state.cursor_row = row;
    Ok(())
}

/// Show or refresh the prompt.
pub(crate) fn draw_prompt(
    prompt: &str,
    buffer: &str,
    cursor_col: usize,
    menu: &[String],
    selected: usize,
) {
    let _guard = lock_output();
    let mut state = prompt_state();
    let result = sync_update(|stdout| {
        if state.visible {
            clear_prompt_area(stdout, &state)?;
        }
        state.visible = true;
        state.prompt = prompt.to_string();
        state.buffer = buffer.to_string();
        state.cursor_col = cursor_col;
        state.menu = menu.to_vec();
        state.selected = selected;
        draw_prompt_area(stdout, &mut state)
    });
    if let Err(e) = result {
        tracing::debug!(error = %e, "Failed to draw prompt");
    }
}

/// Leave the prompt line in place as ordinary output (the submitted line),
/// drop the menu, and move to a fresh line.
pub(crate) fn commit_prompt() {
    let _guard = lock_output();
    let mut state = prompt_state();
    if !state.visible {
        return;
    }
    state.menu.clear();
    let result = sync_update(|stdout| {
        clear_prompt_area(stdout, &state)?;
        write!(stdout, "{}{}\r\n", state.prompt, state.buffer)
    });
    state.visible = false;
    state.cursor_row = 0;
    if let Err(e) = result {
        tracing::debug!(error = %e, "Failed to commit prompt");
    }
}

/// Remove the prompt from the screen entirely.
pub(crate) fn hide_prompt() {
    let _guard = lock_output();
    let mut state = prompt_state();
    if !state.visible {
        return;
    }
    let result = sync_update(|stdout| clear_prompt_area(stdout, &state));
    state.visible = false;
    state.cursor_row = 0;
    if let Err(e) = result {
        tracing::debug!(error = %e, "Failed to hide prompt");
    }
}

/// Write a complete line. When the prompt is visible the line goes above it
/// and the prompt is redrawn below.
pub(crate) fn println_above(text: &str) {
    let _guard = lock_output();
    let mut state = prompt_state();

    let mut text = normalize_newlines(text);
    if !text.ends_with('\n') {
        text.push_str("\r\n");
    }

    let result = if state.visible {
        sync_update(|stdout| {
            clear_prompt_area(stdout, &state)?;
            stdout.write_all(text.as_bytes())?;
            draw_prompt_area(stdout, &mut state)
        })
    } else {
        let mut stdout = io::stdout();
        stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.flush())
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "Failed to write output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\nb"), "a\r\nb");
        assert_eq!(normalize_newlines("a\r\nb"), "a\r\nb");
        assert_eq!(normalize_newlines("plain"), "plain");
        assert_eq!(normalize_newlines("\n\n"), "\r\n\r\n");
    }

    #[test]
    fn test_wrap_position() {
        assert_eq!(wrap_position(0, 80), (0, 0));
        assert_eq!(wrap_position(79, 80), (0, 79));
        assert_eq!(wrap_position(80, 80), (1, 0));
        assert_eq!(wrap_position(165, 80), (2, 5));
        assert_eq!(wrap_position(5, 0), (5, 0));
    }
}
