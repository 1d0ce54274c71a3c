// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Jason Ish

use colored::Colorize;

use super::terminal;
use crate::output::{OutputEvent, OutputListener};

/// Prints output events above the send prompt.
pub(crate) struct CliListener;

impl CliListener {
    pub(crate) fn new() -> Self {
        Self
    }

    fn format(event: &OutputEvent) -> String {
        match event {
            OutputEvent::Info(text) => text.clone(),
            OutputEvent::Message(line) => line.clone(),
            OutputEvent::Error(text) => text.red().to_string(),
            OutputEvent::Notice(text) => text.yellow().to_string(),
        }
    }
}

impl OutputListener for CliListener {
    fn on_event(&self, event: &OutputEvent) {
        terminal::println_above(&Self::format(event));
    }
}
