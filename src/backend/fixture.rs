// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Fixture files for the in-memory backend.
//!
//! A fixture describes the logged-in account, known users, conversations with
//! their history, and local files standing in for downloadable media. Files
//! ending in `.json` are read as JSON, anything else as TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::model::{Conversation, Message, Participant, UserId};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Fixture {
    pub me: Participant,
    #[serde(default)]
    pub users: Vec<Participant>,
    #[serde(default)]
    pub conversations: Vec<ConversationFixture>,
    #[serde(default)]
    pub media: Vec<MediaSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConversationFixture {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(default)]
    pub participants: Vec<UserId>,
    #[serde(default)]
    pub messages: Vec<FixtureMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FixtureMessage {
    #[serde(flatten)]
    pub message: Message,
    /// Deliver as a live message this many milliseconds after startup.
    #[serde(default)]
    pub inbound_after_ms: Option<u64>,
}

/// Local file backing a media id.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MediaSource {
    pub id: i64,
    pub path: PathBuf,
}

impl Fixture {
    pub(crate) fn parse(content: &str, json: bool) -> Result<Self> {
        if json {
            Ok(serde_json::from_str(content)?)
        } else {
            Ok(toml::from_str(content)?)
        }
    }

    /// Load a fixture from disk. Relative media paths resolve against the
    /// fixture's own directory.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let mut fixture = Self::parse(&content, json)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for source in &mut fixture.media {
            if source.path.is_relative() {
                source.path = base.join(&source.path);
            }
        }
        tracing::debug!(
            path = %path.display(),
            conversations = fixture.conversations.len(),
            users = fixture.users.len(),
            "Loaded fixture"
        );
        Ok(fixture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::backend::memory::MemoryBackend;
    use crate::model::{Attachment, ConversationKind};

    const FIXTURE: &str = r#"
[me]
id = 1
handle = "me"
first_name = "Me"

[[users]]
id = 2
handle = "alice"
first_name = "Alice"

[[conversations]]
id = 100
name = "Rustaceans"
kind = "group"
participants = [1, 2]

[[conversations.messages]]
id = 1
sender = 2
text = "hello"

[[conversations.messages]]
id = 2
sender = 2
text = "look"
attachment = { kind = "photo", id = 9, mime_type = "image/png" }

[[conversations.messages]]
id = 3
sender = 2
text = "later"
inbound_after_ms = 10

[[media]]
id = 9
path = "cat.png"
"#;

    #[test]
    fn test_parse_toml() {
        let fixture = Fixture::parse(FIXTURE, false).unwrap();
        assert_eq!(fixture.me.handle.as_deref(), Some("me"));
        assert_eq!(fixture.conversations.len(), 1);

        let room = &fixture.conversations[0];
        assert_eq!(room.conversation.kind, ConversationKind::Group);
        assert_eq!(room.participants, vec![1, 2]);
        assert_eq!(room.messages.len(), 3);
        assert!(matches!(
            room.messages[1].message.attachment,
            Attachment::Photo(_)
        ));
        assert_eq!(room.messages[2].inbound_after_ms, Some(10));
    }

    #[test]
    fn test_parse_json() {
        let fixture = Fixture::parse(
            r#"{"me": {"id": 1}, "conversations": [{"id": 5, "kind": "direct"}]}"#,
            true,
        )
        .unwrap();
        assert_eq!(fixture.me.id, 1);
        assert_eq!(fixture.conversations[0].conversation.id, 5);
        assert!(fixture.users.is_empty());
    }

    #[test]
    fn test_load_resolves_media_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.toml");
        std::fs::write(&path, FIXTURE).unwrap();

        let fixture = Fixture::load(&path).unwrap();
        assert_eq!(fixture.media[0].path, dir.path().join("cat.png"));
    }

    #[test]
    fn test_demo_fixture_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/fixture.toml");
        let fixture = Fixture::load(&path).unwrap();
        assert_eq!(fixture.conversations.len(), 5);
        assert!(fixture.media[0].path.exists());
    }

    #[tokio::test]
    async fn test_scheduled_messages_held_back() {
        let fixture = Fixture::parse(FIXTURE, false).unwrap();
        let backend = MemoryBackend::from_fixture(fixture);

        let history = backend.recent_messages(100, 10).await.unwrap();
        let ids: Vec<_> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(history.iter().all(|m| m.conversation == 100));
    }

    #[tokio::test]
    async fn test_replay_delivers_to_subscribers() {
        let fixture = Fixture::parse(FIXTURE, false).unwrap();
        let backend = MemoryBackend::from_fixture(fixture);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        backend.subscribe(100, tx).await.unwrap();

        backend.spawn_replay();
        let message = rx.recv().await.unwrap();
        assert_eq!(message.id, 3);
        assert_eq!(message.text, "later");
    }
}
