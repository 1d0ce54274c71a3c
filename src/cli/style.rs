// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jason Ish

use crossterm::style::Color;

/// Prompt shown while a conversation is active.
pub(super) const SEND_PROMPT: &str = "Send message: ";

pub(super) const MENU_BG_NORMAL: Color = Color::Rgb {
    r: 20,
    g: 20,
    b: 20,
};

pub(super) const MENU_BG_SELECTED: Color = Color::Rgb {
    r: 30,
    g: 30,
    b: 30,
};

pub(super) const MENU_FG_NORMAL: Color = Color::Rgb {
    r: 150,
    g: 150,
    b: 150,
};

pub(super) const MENU_FG_SELECTED: Color = Color::Rgb {
    r: 200,
    g: 200,
    b: 200,
};
