// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Interactive terminal front end.

mod completion_menu;
mod editor;
mod input;
mod listener;
mod style;
mod terminal;

use std::path::Path;
use std::sync::Arc;

use crate::backend::fixture::Fixture;
use crate::backend::memory::MemoryBackend;
use crate::config::Config;
use crate::error::Result;
use crate::output::{self, OutputContext};
use crate::session::Session;

use input::PromptUi;
use listener::CliListener;

/// Run the client against the conversations described by `fixture`.
///
/// Errors are reported to the terminal before returning.
pub(crate) async fn run(config: Config, fixture: &Path) -> Result<()> {
    let fixture = match Fixture::load(fixture) {
        Ok(fixture) => fixture,
        Err(e) => {
            print_fatal(&format!("Error: {e}"));
            return Err(e);
        }
    };
    let backend = MemoryBackend::from_fixture(fixture);
    backend.spawn_replay();

    let output = OutputContext::new(Arc::new(CliListener::new()));
    let mut session = Session::new(&backend, PromptUi::new(), &config, output.clone());

    tokio::select! {
        result = session.run() => result,
        _ = tokio::signal::ctrl_c() => {
            terminal::hide_prompt();
            output::print_info(&output, "byebye!");
            Ok(())
        }
    }
}

/// Print an error outside of a session.
pub(crate) fn print_fatal(message: &str) {
    terminal::hide_prompt();
    eprintln!("{}", message);
}
