// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Message rendering.
//!
//! Turns a [`Message`] into a single display string of the form
//! `[{id}] {sender}: {reply}{body}`. History, live messages and the user's own
//! replies all go through the same path.

pub(crate) mod attachments;
pub(crate) mod raster;

use std::path::PathBuf;

use crate::backend::Backend;
use crate::config::Config;
use crate::model::{Attachment, ConversationId, Message, MessageId, Participant};
use crate::output::{self, OutputContext};

use attachments::Cached;

const UNKNOWN_SENDER: &str = "Unknown";

#[derive(Debug, Clone)]
pub(crate) struct RenderOptions {
    pub auto_download_image: bool,
    pub download_dir: PathBuf,
    pub ascii_width: u32,
    pub ascii_color: bool,
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            auto_download_image: config.auto_download_image,
            download_dir: config.download_dir.clone(),
            ascii_width: config.ascii_width,
            ascii_color: config.ascii_color,
        }
    }
}

/// `"{name} ({handle})"`, the handle alone, the name alone, or `None`.
fn label(participant: &Participant) -> Option<String> {
    let name = participant.display_name();
    match (participant.handle(), name.is_empty()) {
        (Some(handle), false) => Some(format!("{name} ({handle})")),
        (Some(handle), true) => Some(handle.to_string()),
        (None, false) => Some(name),
        (None, true) => None,
    }
}

pub(crate) fn sender_display(sender: Option<&Participant>) -> String {
    sender
        .and_then(label)
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string())
}

pub(crate) struct Renderer<'a, B> {
    backend: &'a B,
    options: RenderOptions,
    output: OutputContext,
}

impl<'a, B: Backend> Renderer<'a, B> {
    pub(crate) fn new(backend: &'a B, options: RenderOptions, output: OutputContext) -> Self {
        Self {
            backend,
            options,
            output,
        }
    }

    pub(crate) async fn render(&self, conversation: ConversationId, message: &Message) -> String {
        let sender = match self.backend.sender(message).await {
            Ok(sender) => sender,
            Err(e) => {
                tracing::debug!(message = message.id, error = %e, "Sender lookup failed");
                None
            }
        };
        let reply = match message.reply_to {
            Some(target) => self.reply_annotation(conversation, target).await,
            None => String::new(),
        };
        let body = self.body(message).await;
        format!(
            "[{}] {}: {}{}",
            message.id,
            sender_display(sender.as_ref()),
            reply,
            body
        )
    }

    /// `"(reply > {name}) "`, or `"(reply > [{id}]) "` when the target or its
    /// sender cannot be resolved. Never fails.
    pub(crate) async fn reply_annotation(
        &self,
        conversation: ConversationId,
        target: MessageId,
    ) -> String {
        match self.resolve_reply_name(conversation, target).await {
            Some(name) => format!("(reply > {name}) "),
            None => format!("(reply > [{target}]) "),
        }
    }

    async fn resolve_reply_name(
        &self,
        conversation: ConversationId,
        target: MessageId,
    ) -> Option<String> {
        let message = match self.backend.message(conversation, target).await {
            Ok(Some(message)) => message,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(target, error = %e, "Reply target lookup failed");
                return None;
            }
        };
        match self.backend.sender(&message).await {
            Ok(sender) => sender.as_ref().and_then(label),
            Err(e) => {
                tracing::debug!(target, error = %e, "Reply sender lookup failed");
                None
            }
        }
    }

    async fn body(&self, message: &Message) -> String {
        let text = &message.text;
        match &message.attachment {
            Attachment::None => text.clone(),
            Attachment::Sticker => "[sticker]".to_string(),
            Attachment::Media(_) => format!("[media] {text}"),
            Attachment::Photo(media) => {
                if !self.options.auto_download_image {
                    return format!("[image] {text}");
                }

                let path = attachments::cache_path(&self.options.download_dir, media);
                match attachments::ensure_cached(self.backend, message, &path).await {
                    Ok(Cached::Downloaded) => output::print_info(
                        &self.output,
                        &format!("Downloaded image to: {}", path.display()),
                    ),
                    Ok(Cached::Hit) => {}
                    Err(e) => {
                        tracing::warn!(message = message.id, error = %e, "Image download failed");
                        let text = format!("Failed to download image: {e}");
                        output::print_error(&self.output, &text);
                    }
                }

                if path.exists() {
                    let raster = raster::image_to_ascii(
                        &path,
                        self.options.ascii_width,
                        self.options.ascii_color,
                    );
                    format!("\n{raster}{text}")
                } else {
                    format!("[image not found: {}] {text}", path.display())
                }
            }
        }
    }
}
