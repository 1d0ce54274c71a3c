// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Per-conversation completion index.
//!
//! Built once when a conversation becomes active and never refreshed while it
//! stays active. Participants that join later, and messages that arrive after
//! the build, are not indexed.

use std::collections::BTreeSet;

use crate::backend::Backend;
use crate::error::Result;
use crate::model::{Conversation, Message, MessageId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Index {
    /// Distinct participant handles, sorted.
    handles: Vec<String>,
    /// Recent message ids in the order the backend returned them.
    message_ids: Vec<MessageId>,
}

impl Index {
    pub(crate) fn from_parts<I, S>(handles: I, message_ids: Vec<MessageId>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handles: BTreeSet<String> = handles.into_iter().map(Into::into).collect();
        Self {
            handles: handles.into_iter().collect(),
            message_ids,
        }
    }

    /// Build the index for `conversation`.
    ///
    /// Returns the fetched messages (newest first) alongside the index so the
    /// caller can print history without a second round trip.
    pub(crate) async fn build<B: Backend>(
        backend: &B,
        conversation: &Conversation,
        history_limit: usize,
    ) -> Result<(Self, Vec<Message>)> {
        let participants = backend.participants(conversation.id).await?;
        let messages = backend
            .recent_messages(conversation.id, history_limit)
            .await?;

        let handles = participants
            .iter()
            .filter_map(|p| p.handle())
            .map(str::to_string);
        let index = Self::from_parts(handles, messages.iter().map(|m| m.id).collect());

        tracing::debug!(
            conversation = conversation.id,
            handles = index.handles.len(),
            messages = index.message_ids.len(),
            "Built completion index"
        );
        Ok((index, messages))
    }

    pub(crate) fn handles(&self) -> &[String] {
        &self.handles
    }

    pub(crate) fn message_ids(&self) -> &[MessageId] {
        &self.message_ids
    }
}
