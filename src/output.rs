// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

use std::sync::Arc;

/// Output events produced by the session engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputEvent {
    /// Informational message (menus, join banners, download confirmations)
    Info(String),
    /// Error message
    Error(String),
    /// A rendered chat message
    Message(String),
    /// Low-key status line (usage hints, "not found" reports)
    Notice(String),
}

/// Trait for listening to output events
pub(crate) trait OutputListener: Send + Sync {
    fn on_event(&self, event: &OutputEvent);
}

/// Context for emitting output events. Cheap to clone (Arc internally).
#[derive(Clone)]
pub(crate) struct OutputContext {
    listener: Option<Arc<dyn OutputListener>>,
}

impl OutputContext {
    pub(crate) fn new(listener: Arc<dyn OutputListener>) -> Self {
        Self {
            listener: Some(listener),
        }
    }

    /// Create a null output context that discards all events (for tests)
    #[cfg(test)]
    pub(crate) fn null() -> Self {
        Self { listener: None }
    }

    pub(crate) fn emit(&self, event: OutputEvent) {
        if let Some(listener) = &self.listener {
            listener.on_event(&event);
        }
    }
}

pub(crate) fn print_info(ctx: &OutputContext, text: &str) {
    ctx.emit(OutputEvent::Info(text.to_string()));
}

pub(crate) fn print_error(ctx: &OutputContext, text: &str) {
    ctx.emit(OutputEvent::Error(text.to_string()));
}

pub(crate) fn print_message(ctx: &OutputContext, line: &str) {
    ctx.emit(OutputEvent::Message(line.to_string()));
}

pub(crate) fn print_notice(ctx: &OutputContext, text: &str) {
    ctx.emit(OutputEvent::Notice(text.to_string()));
}
