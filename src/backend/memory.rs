// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! In-memory backend.
//!
//! Holds conversations, users and messages in process. It backs fixture mode
//! (`--fixture`) and is the test double for everything that needs a backend.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::{
    Attachment, Conversation, ConversationId, ConversationKind, Message, MessageId, Participant,
    UserId,
};

use super::fixture::Fixture;
use super::{Backend, Inbound, SubscriptionToken};

/// Backend operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    Conversations,
    RecentMessages,
    Message,
    Sender,
    Participants,
    Send,
    Download,
}

/// A message sent through [`MemoryBackend::send`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SentMessage {
    pub conversation: ConversationId,
    pub text: String,
    pub reply_to: Option<MessageId>,
}

struct Room {
    conversation: Conversation,
    members: Vec<UserId>,
    messages: BTreeMap<MessageId, Message>,
}

impl Room {
    fn last_id(&self) -> MessageId {
        self.messages.keys().next_back().copied().unwrap_or(0)
    }
}

/// Message scheduled for delivery after the session starts.
struct Scheduled {
    after: Duration,
    message: Message,
}

struct Subscriber {
    conversation: ConversationId,
    inbound: Inbound,
}

#[derive(Default)]
struct State {
    me: Participant,
    users: HashMap<UserId, Participant>,
    rooms: Vec<Room>,
    media: HashMap<i64, PathBuf>,
    scheduled: Vec<Scheduled>,
    subscribers: HashMap<u64, Subscriber>,
    next_token: u64,
    failing: HashSet<Op>,
    downloads: usize,
    #[cfg(test)]
    sent: Vec<SentMessage>,
}

impl State {
    fn room(&self, id: ConversationId) -> Result<&Room> {
        self.rooms
            .iter()
            .find(|r| r.conversation.id == id)
            .ok_or_else(|| Error::NotFound(format!("conversation {id}")))
    }

    fn room_mut(&mut self, id: ConversationId) -> Result<&mut Room> {
        self.rooms
            .iter_mut()
            .find(|r| r.conversation.id == id)
            .ok_or_else(|| Error::NotFound(format!("conversation {id}")))
    }

    fn check(&self, op: Op) -> Result<()> {
        if self.failing.contains(&op) {
            return Err(Error::Backend(format!("{op:?} failed")));
        }
        Ok(())
    }

    /// The conversation as listed: direct chats carry their peer.
    fn listing(&self, room: &Room) -> Conversation {
        let mut conversation = room.conversation.clone();
        if conversation.kind == ConversationKind::Direct {
            conversation.peer = room
                .members
                .iter()
                .find(|id| **id != self.me.id)
                .and_then(|id| self.users.get(id))
                .cloned();
        }
        conversation
    }

    /// Store `message` and hand it to every subscriber of its conversation.
    ///
    /// Ids stay increasing: a message whose id is not above the newest one
    /// is renumbered.
    fn deliver(&mut self, mut message: Message) -> Result<()> {
        let conversation = message.conversation;
        let room = self.room_mut(conversation)?;
        let last = room.last_id();
        if message.id <= last {
            message.id = last + 1;
        }
        room.messages.insert(message.id, message.clone());

        // Drop subscribers whose receiving side went away.
        self.subscribers.retain(|_, sub| {
            sub.conversation != conversation || sub.inbound.send(message.clone()).is_ok()
        });
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub(crate) fn new(me: Participant) -> Self {
        let backend = Self::default();
        backend.lock().users.insert(me.id, me.clone());
        backend.lock().me = me;
        backend
    }

    /// Build a backend from a fixture. Messages carrying a delivery delay are
    /// held back until [`MemoryBackend::spawn_replay`] runs.
    pub(crate) fn from_fixture(fixture: Fixture) -> Self {
        let backend = Self::new(fixture.me);
        for user in fixture.users {
            backend.add_user(user);
        }
        for source in fixture.media {
            backend.add_media(source.id, source.path);
        }
        for room in fixture.conversations {
            let id = room.conversation.id;
            backend.add_conversation(room.conversation, room.participants);
            for entry in room.messages {
                let mut message = entry.message;
                message.conversation = id;
                match entry.inbound_after_ms {
                    Some(ms) => backend.lock().scheduled.push(Scheduled {
                        after: Duration::from_millis(ms),
                        message,
                    }),
                    None => backend.insert_message(message),
                }
            }
        }
        backend
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn add_user(&self, user: Participant) {
        self.lock().users.insert(user.id, user);
    }

    pub(crate) fn add_conversation(&self, conversation: Conversation, members: Vec<UserId>) {
        self.lock().rooms.push(Room {
            conversation,
            members,
            messages: BTreeMap::new(),
        });
    }

    /// Register the local file that backs media `id`.
    pub(crate) fn add_media(&self, id: i64, path: PathBuf) {
        self.lock().media.insert(id, path);
    }

    /// Store a message without notifying subscribers (history).
    pub(crate) fn insert_message(&self, message: Message) {
        let mut state = self.lock();
        if let Ok(room) = state.room_mut(message.conversation) {
            room.messages.insert(message.id, message);
        }
    }

    /// Store a message and push it to subscribers, as if it just arrived.
    pub(crate) fn deliver(&self, message: Message) -> Result<()> {
        self.lock().deliver(message)
    }

    /// Deliver scheduled fixture messages on background tasks.
    pub(crate) fn spawn_replay(&self) {
        let scheduled = std::mem::take(&mut self.lock().scheduled);
        for item in scheduled {
            let backend = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(item.after).await;
                let id = item.message.id;
                if let Err(e) = backend.deliver(item.message) {
                    tracing::warn!(message = id, error = %e, "Failed to replay fixture message");
                }
            });
        }
    }

    #[cfg(test)]
    /// Make every later call of `op` fail with a backend error.
    pub(crate) fn fail(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    #[cfg(test)]
    pub(crate) fn sent(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    #[cfg(test)]
    /// Number of media downloads attempted so far.
    pub(crate) fn download_count(&self) -> usize {
        self.lock().downloads
    }

    #[cfg(test)]
    pub(crate) fn active_subscriptions(&self) -> Vec<ConversationId> {
        self.lock()
            .subscribers
            .values()
            .map(|s| s.conversation)
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn remove_member(&self, conversation: ConversationId, user: UserId) {
        if let Ok(room) = self.lock().room_mut(conversation) {
            room.members.retain(|id| *id != user);
        }
    }
}

impl Backend for MemoryBackend {
    async fn me(&self) -> Result<Participant> {
        Ok(self.lock().me.clone())
    }

    async fn conversations(&self, limit: usize) -> Result<Vec<Conversation>> {
        let state = self.lock();
        state.check(Op::Conversations)?;
        Ok(state
            .rooms
            .iter()
            .take(limit)
            .map(|r| state.listing(r))
            .collect())
    }

    async fn recent_messages(
        &self,
        conversation: ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let state = self.lock();
        state.check(Op::RecentMessages)?;
        Ok(state
            .room(conversation)?
            .messages
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn message(
        &self,
        conversation: ConversationId,
        id: MessageId,
    ) -> Result<Option<Message>> {
        let state = self.lock();
        state.check(Op::Message)?;
        Ok(state.room(conversation)?.messages.get(&id).cloned())
    }

    async fn sender(&self, message: &Message) -> Result<Option<Participant>> {
        let state = self.lock();
        state.check(Op::Sender)?;
        Ok(message.sender.and_then(|id| state.users.get(&id).cloned()))
    }

    async fn participants(&self, conversation: ConversationId) -> Result<Vec<Participant>> {
        let state = self.lock();
        state.check(Op::Participants)?;
        let room = state.room(conversation)?;
        Ok(room
            .members
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn subscribe(
        &self,
        conversation: ConversationId,
        inbound: Inbound,
    ) -> Result<SubscriptionToken> {
        let mut state = self.lock();
        state.room(conversation)?;
        state.next_token += 1;
        let id = state.next_token;
        state.subscribers.insert(
            id,
            Subscriber {
                conversation,
                inbound,
            },
        );
        Ok(SubscriptionToken::new(id))
    }

    async fn unsubscribe(&self, token: SubscriptionToken) -> Result<()> {
        self.lock().subscribers.remove(&token.id());
        Ok(())
    }

    async fn send(
        &self,
        conversation: ConversationId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<Message> {
        let mut state = self.lock();
        state.check(Op::Send)?;
        let sender = state.me.id;
        let room = state.room_mut(conversation)?;
        let id = room.last_id() + 1;
        let message = Message {
            id,
            conversation,
            sender: Some(sender),
            text: text.to_string(),
            attachment: Attachment::None,
            reply_to,
        };
        room.messages.insert(id, message.clone());
        #[cfg(test)]
        state.sent.push(SentMessage {
            conversation,
            text: text.to_string(),
            reply_to,
        });
        Ok(message)
    }

    async fn download_media(&self, message: &Message, path: &Path) -> Result<()> {
        let source = {
            let mut state = self.lock();
            state.check(Op::Download)?;
            state.downloads += 1;
            let media = match &message.attachment {
                Attachment::Photo(media) | Attachment::Media(media) => media,
                _ => {
                    return Err(Error::NotFound(format!(
                        "message {} has no media",
                        message.id
                    )));
                }
            };
            state
                .media
                .get(&media.id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("media {}", media.id)))?
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, path).await?;
        Ok(())
    }
}
