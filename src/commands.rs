// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Input line classification and dispatch.

use crate::backend::Backend;
use crate::error::Result;
use crate::model::{Conversation, MessageId};
use crate::output::{self, OutputContext};
use crate::render::Renderer;

/// Leaves the active conversation.
pub(crate) const QUIT_SENTINEL: &str = ":wq";

/// Reply command keyword: `/r <id> <message>`.
pub(crate) const REPLY_KEYWORD: &str = "/r";

const REPLY_USAGE: &str = "usage: /r <id> <message>";
const MENTION_USAGE: &str = "usage: @<handle> <message>";

/// A classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Quit,
    ReplySend { target: MessageId, body: String },
    MentionSend { handle: String, body: String },
    PlainSend { body: String },
    Invalid(String),
}

/// Split off up to `n - 1` whitespace-delimited fields. The last field is the
/// untouched remainder of the line.
fn split_fields(line: &str, n: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(n);
    let mut rest = line.trim_start();
    while !rest.is_empty() {
        if fields.len() + 1 == n {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }
    fields
}

pub(crate) fn classify(line: &str) -> Command {
    if line.trim() == QUIT_SENTINEL {
        return Command::Quit;
    }

    if line
        .strip_prefix(REPLY_KEYWORD)
        .is_some_and(|rest| rest.starts_with(' '))
    {
        let fields = split_fields(line, 3);
        if fields.len() < 3 {
            return Command::Invalid(REPLY_USAGE.to_string());
        }
        return match fields[1].parse::<MessageId>() {
            Ok(target) => Command::ReplySend {
                target,
                body: fields[2].to_string(),
            },
            Err(_) => Command::Invalid(format!("invalid message id: {}", fields[1])),
        };
    }

    if let Some(rest) = line.strip_prefix('@') {
        return match rest.split_once(' ') {
            Some((handle, body)) => Command::MentionSend {
                handle: handle.to_string(),
                body: body.to_string(),
            },
            None => Command::Invalid(MENTION_USAGE.to_string()),
        };
    }

    Command::PlainSend {
        body: line.to_string(),
    }
}

/// What the session should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// Executes commands against the active conversation.
pub(crate) struct Dispatcher<'a, B> {
    backend: &'a B,
    renderer: &'a Renderer<'a, B>,
    output: &'a OutputContext,
    conversation: &'a Conversation,
}

impl<'a, B: Backend> Dispatcher<'a, B> {
    pub(crate) fn new(
        backend: &'a B,
        renderer: &'a Renderer<'a, B>,
        output: &'a OutputContext,
        conversation: &'a Conversation,
    ) -> Self {
        Self {
            backend,
            renderer,
            output,
            conversation,
        }
    }

    /// Run `command`. Backend failures are reported and never end the session.
    pub(crate) async fn execute(&self, command: Command) -> Flow {
        let result = match command {
            Command::Quit => return Flow::Quit,
            Command::Invalid(reason) => {
                output::print_notice(self.output, &reason);
                Ok(())
            }
            Command::ReplySend { target, body } => self.reply(target, &body).await,
            Command::MentionSend { handle, body } => self.mention(&handle, &body).await,
            Command::PlainSend { body } => self
                .backend
                .send(self.conversation.id, &body, None)
                .await
                .map(|_| ()),
        };

        if let Err(e) = result {
            tracing::warn!(conversation = self.conversation.id, error = %e, "Send failed");
            output::print_error(self.output, &format!("Error: {e}"));
        }
        Flow::Continue
    }

    async fn reply(&self, target: MessageId, body: &str) -> Result<()> {
        let sent = self
            .backend
            .send(self.conversation.id, body, Some(target))
            .await?;
        let line = self.renderer.render(self.conversation.id, &sent).await;
        output::print_message(self.output, &line);
        Ok(())
    }

    async fn mention(&self, handle: &str, body: &str) -> Result<()> {
        // Re-query: the completion index may be stale.
        let participants = self.backend.participants(self.conversation.id).await?;
        if !participants.iter().any(|p| p.handle() == Some(handle)) {
            output::print_notice(self.output, &format!("User @{handle} not found in this chat."));
            return Ok(());
        }
        self.backend
            .send(self.conversation.id, &format!("@{handle} {body}"), None)
            .await?;
        Ok(())
    }
}
