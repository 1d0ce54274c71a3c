// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

use std::io::{self, IsTerminal};

use crossterm::cursor;
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyEventKind,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::editor::{EditOutcome, LineEditor};
use super::style::SEND_PROMPT;
use super::terminal;
use crate::error::{Error, Result};
use crate::roster::Index;
use crate::session::{InputEvent, InputSource};

const MENU_PROMPT: &str = "Enter chat number to join:";

/// Interactive input: a raw-mode line editor with completion on a terminal,
/// plain line reads otherwise.
pub(crate) enum PromptUi {
    Interactive(Interactive),
    Lines(Lines<BufReader<Stdin>>),
}

pub(crate) struct Interactive {
    editor: LineEditor,
    events: Option<EventStream>,
    raw: Option<RawModeGuard>,
}

impl PromptUi {
    pub(crate) fn new() -> Self {
        if io::stdin().is_terminal() && io::stdout().is_terminal() {
            PromptUi::Interactive(Interactive {
                editor: LineEditor::default(),
                events: None,
                raw: None,
            })
        } else {
            PromptUi::Lines(BufReader::new(tokio::io::stdin()).lines())
        }
    }
}

impl Interactive {
    fn redraw(&self) {
        let (menu, selected) = self.editor.menu();
        terminal::draw_prompt(
            SEND_PROMPT,
            self.editor.buffer(),
            self.editor.cursor_col(),
            &menu,
            selected,
        );
    }

    fn enter_raw_mode(&mut self) -> io::Result<()> {
        if self.raw.is_none() {
            self.raw = Some(RawModeGuard::new()?);
        }
        if self.events.is_none() {
            self.events = Some(EventStream::new());
        }
        Ok(())
    }

    fn leave_raw_mode(&mut self) {
        terminal::hide_prompt();
        self.events = None;
        self.raw = None;
    }

    async fn next_line(&mut self, index: &Index) -> Result<InputEvent> {
        self.enter_raw_mode()?;
        self.redraw();

        loop {
            let Some(events) = self.events.as_mut() else {
                return Ok(InputEvent::Interrupt);
            };
            let Some(event) = events.next().await else {
                terminal::commit_prompt();
                return Ok(InputEvent::Interrupt);
            };

            match event? {
                Event::Key(key)
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                {
                    match self.editor.handle_key(key, index) {
                        EditOutcome::Redraw => self.redraw(),
                        EditOutcome::Unchanged => {}
                        EditOutcome::Submit(line) => {
                            // Show the submitted text, then clear it from the editor view.
                            terminal::draw_prompt(SEND_PROMPT, &line, 0, &[], 0);
                            terminal::commit_prompt();
                            return Ok(InputEvent::Line(line));
                        }
                        EditOutcome::Interrupt => {
                            terminal::commit_prompt();
                            return Ok(InputEvent::Interrupt);
                        }
                    }
                }
                Event::Paste(text) => {
                    self.editor.insert_str(&text);
                    self.redraw();
                }
                Event::Resize(_, _) => self.redraw(),
                _ => {}
            }
        }
    }

    async fn menu_choice(&mut self) -> Result<InputEvent> {
        self.leave_raw_mode();
        let answer =
            tokio::task::spawn_blocking(|| inquire::Text::new(MENU_PROMPT).prompt())
                .await
                .map_err(|e| Error::Prompt(e.to_string()))?;
        Ok(InputEvent::Line(answer?))
    }
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Result<InputEvent> {
    match lines.next_line().await? {
        Some(line) => Ok(InputEvent::Line(line)),
        None => Ok(InputEvent::Interrupt),
    }
}

impl InputSource for PromptUi {
    async fn menu_choice(&mut self) -> Result<InputEvent> {
        match self {
            PromptUi::Interactive(ui) => ui.menu_choice().await,
            PromptUi::Lines(lines) => {
                terminal::println_above(MENU_PROMPT);
                read_line(lines).await
            }
        }
    }

    async fn next_line(&mut self, index: &Index) -> Result<InputEvent> {
        match self {
            PromptUi::Interactive(ui) => ui.next_line(index).await,
            PromptUi::Lines(lines) => read_line(lines).await,
        }
    }
}

struct RawModeGuard {
    keyboard_flags_enabled: bool,
}

impl RawModeGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;

        crossterm::execute!(io::stdout(), EnableBracketedPaste).ok();

        let keyboard_flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
            | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        let keyboard_flags_enabled =
            crossterm::execute!(io::stdout(), PushKeyboardEnhancementFlags(keyboard_flags))
                .is_ok();

        Ok(Self {
            keyboard_flags_enabled,
        })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.keyboard_flags_enabled {
            let _ = crossterm::execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = crossterm::execute!(io::stdout(), DisableBracketedPaste);
        disable_raw_mode().ok();
        let _ = crossterm::execute!(io::stdout(), cursor::Show);
    }
}
