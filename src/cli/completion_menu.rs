// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jason Ish

//! Completion popup drawn below the send prompt.

use std::borrow::Cow;
use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, ClearType};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::style::{MENU_BG_NORMAL, MENU_BG_SELECTED, MENU_FG_NORMAL, MENU_FG_SELECTED};

/// Maximum number of completion items to display at once.
const MENU_MAX_VISIBLE: usize = 8;

/// First visible item so that `selected` stays in view.
pub(super) fn window_start(total: usize, selected: usize) -> usize {
    let visible_count = MENU_MAX_VISIBLE.min(total);
    let max_start = total.saturating_sub(visible_count);
    selected
        .saturating_sub(visible_count.saturating_sub(1))
        .min(max_start)
}

/// Truncate `item` to `max_width` columns, ending in an ellipsis when cut.
pub(super) fn fit(item: &str, max_width: usize) -> Cow<'_, str> {
    if item.width() <= max_width {
        return Cow::Borrowed(item);
    }
    let mut width = 0;
    let truncated: String = item
        .chars()
        .take_while(|c| {
            width += c.width().unwrap_or(0);
            width < max_width // leave room for '…'
        })
        .chain(std::iter::once('…'))
        .collect();
    Cow::Owned(truncated)
}

/// Write the menu on the rows below the cursor. Returns the rows used.
pub(super) fn render(
    stdout: &mut io::Stdout,
    items: &[String],
    selected: usize,
) -> io::Result<u16> {
    if items.is_empty() {
        return Ok(0);
    }

    let total = items.len();
    let selected = selected.min(total - 1);
    let start = window_start(total, selected);
    let end = (start + MENU_MAX_VISIBLE).min(total);
    let term_width = terminal::size().map(|(w, _)| w as usize).unwrap_or(80);
    let mut rows = 0u16;

    for (i, item) in items[start..end].iter().enumerate() {
        let (bg_color, fg_color) = if start + i == selected {
            (MENU_BG_SELECTED, MENU_FG_SELECTED)
        } else {
            (MENU_BG_NORMAL, MENU_FG_NORMAL)
        };

        // One leading space, then item text.
        let item_text = fit(item, term_width.saturating_sub(2));
        let trailing = term_width.saturating_sub(1 + item_text.width() + 1);

        write!(stdout, "\r\n")?;
        queue!(
            stdout,
            terminal::Clear(ClearType::CurrentLine),
            SetBackgroundColor(bg_color),
            SetForegroundColor(fg_color)
        )?;
        write!(stdout, " {}{}", item_text, " ".repeat(trailing))?;
        queue!(stdout, ResetColor)?;
        rows += 1;
    }

    if total > end - start {
        write!(stdout, "\r\n")?;
        queue!(
            stdout,
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::DarkGrey)
        )?;
        write!(stdout, "  ({}/{} matches)", selected + 1, total)?;
        queue!(stdout, ResetColor)?;
        rows += 1;
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_keeps_selection_visible() {
        assert_eq!(window_start(3, 2), 0);
        assert_eq!(window_start(20, 0), 0);
        assert_eq!(window_start(20, 7), 0);
        assert_eq!(window_start(20, 8), 1);
        assert_eq!(window_start(20, 19), 12);
    }

    #[test]
    fn test_fit_truncates_with_ellipsis() {
        assert_eq!(fit("alice", 10), "alice");
        assert_eq!(fit("abcdefghij", 5), "abcd…");
    }
}
