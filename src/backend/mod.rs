// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Messaging backend seam.
//!
//! The session engine only talks to the backend through [`Backend`]. Transport,
//! authentication and storage live behind it.

pub(crate) mod fixture;
pub(crate) mod memory;

use std::future::Future;
use std::path::Path;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::model::{Conversation, ConversationId, Message, MessageId, Participant};

/// Channel end that receives new messages for a subscribed conversation.
pub(crate) type Inbound = mpsc::UnboundedSender<Message>;

/// Owned handle for a live new-message subscription.
///
/// Not `Clone`: the token is consumed by [`Backend::unsubscribe`], so a
/// subscription can only be torn down once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Operations the session engine needs from a messaging backend.
pub(crate) trait Backend: Send + Sync {
    /// The logged-in account.
    fn me(&self) -> impl Future<Output = Result<Participant>> + Send;

    /// Most recent conversations, newest first.
    fn conversations(&self, limit: usize)
    -> impl Future<Output = Result<Vec<Conversation>>> + Send;

    /// Up to `limit` most recent messages of a conversation, newest first.
    fn recent_messages(
        &self,
        conversation: ConversationId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Message>>> + Send;

    /// A single message, or `None` if it does not exist.
    fn message(
        &self,
        conversation: ConversationId,
        id: MessageId,
    ) -> impl Future<Output = Result<Option<Message>>> + Send;

    /// Sender metadata for a message, or `None` when unknown.
    fn sender(&self, message: &Message) -> impl Future<Output = Result<Option<Participant>>> + Send;

    /// Current participants of a conversation.
    fn participants(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<Vec<Participant>>> + Send;

    /// Deliver every new incoming message of `conversation` to `inbound`
    /// until the returned token is passed to [`Backend::unsubscribe`].
    fn subscribe(
        &self,
        conversation: ConversationId,
        inbound: Inbound,
    ) -> impl Future<Output = Result<SubscriptionToken>> + Send;

    fn unsubscribe(&self, token: SubscriptionToken) -> impl Future<Output = Result<()>> + Send;

    /// Send a text message, optionally as a reply. Returns the stored message.
    fn send(
        &self,
        conversation: ConversationId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> impl Future<Output = Result<Message>> + Send;

    /// Download the media attached to `message` into `path`.
    fn download_media(
        &self,
        message: &Message,
        path: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}
