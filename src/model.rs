// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Value types shared by the backend, the renderer and the session.

use serde::{Deserialize, Serialize};

pub(crate) type ConversationId = i64;
pub(crate) type MessageId = i64;
pub(crate) type UserId = i64;

/// Extension used for photos whose MIME type is missing or unmapped.
pub(crate) const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ConversationKind {
    Direct,
    Group,
    Broadcast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub name: String,
    pub kind: ConversationKind,
    /// Direct conversations: the other party, resolved by the backend when
    /// listing.
    #[serde(skip)]
    pub peer: Option<Participant>,
    /// Groups: posting or membership is restricted.
    #[serde(default)]
    pub restricted: bool,
    /// Broadcasts: flagged as a discussion (mega-group) variant.
    #[serde(default)]
    pub megagroup: bool,
}

impl Conversation {
    /// Whether the conversation is offered in the selection menu.
    pub(crate) fn is_listable(&self) -> bool {
        match self.kind {
            ConversationKind::Direct => !self.peer.as_ref().is_some_and(|p| p.bot),
            ConversationKind::Group => !self.restricted,
            ConversationKind::Broadcast => self.megagroup,
        }
    }

    pub(crate) fn title(&self) -> &str {
        if self.name.trim().is_empty() {
            "(no title)"
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) struct Participant {
    pub id: UserId,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl Participant {
    /// First and last name joined by a space; empty when both are absent.
    pub(crate) fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn handle(&self) -> Option<&str> {
        self.handle.as_deref().filter(|h| !h.is_empty())
    }
}

/// A downloadable media object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Media {
    pub id: i64,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl Media {
    /// File extension (with leading dot) derived from the MIME type.
    pub(crate) fn extension(&self) -> &'static str {
        match self.mime_type.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("image/jpeg" | "image/jpg" | "image/pjpeg") => ".jpg",
            Some("image/png") => ".png",
            Some("image/gif") => ".gif",
            Some("image/webp") => ".webp",
            Some("image/bmp" | "image/x-ms-bmp") => ".bmp",
            _ => DEFAULT_IMAGE_EXTENSION,
        }
    }

    /// Cache key: `{id}{extension}`.
    pub(crate) fn cache_file_name(&self) -> String {
        format!("{}{}", self.id, self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Attachment {
    #[default]
    None,
    Sticker,
    Photo(Media),
    Media(Media),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Message {
    pub id: MessageId,
    #[serde(default)]
    pub conversation: ConversationId,
    #[serde(default)]
    pub sender: Option<UserId>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachment: Attachment,
    #[serde(default)]
    pub reply_to: Option<MessageId>,
}

impl Message {
    #[cfg(test)]
    pub(crate) fn plain(id: MessageId, sender: UserId, text: &str) -> Self {
        Self {
            id,
            conversation: 0,
            sender: Some(sender),
            text: text.to_string(),
            attachment: Attachment::None,
            reply_to: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(kind: ConversationKind) -> Conversation {
        Conversation {
            id: 1,
            name: "chat".into(),
            kind,
            peer: None,
            restricted: false,
            megagroup: false,
        }
    }

    #[test]
    fn test_listable_filter() {
        let direct = conversation(ConversationKind::Direct);
        assert!(direct.is_listable());
        let person = Conversation {
            peer: Some(Participant {
                id: 2,
                ..Participant::default()
            }),
            ..direct.clone()
        };
        assert!(person.is_listable());
        let bot = Conversation {
            peer: Some(Participant {
                id: 3,
                bot: true,
                ..Participant::default()
            }),
            ..direct.clone()
        };
        assert!(!bot.is_listable());

        let group = conversation(ConversationKind::Group);
        assert!(group.is_listable());
        let restricted = Conversation {
            restricted: true,
            ..group
        };
        assert!(!restricted.is_listable());

        let channel = conversation(ConversationKind::Broadcast);
        assert!(!channel.is_listable());
        let megagroup = Conversation {
            megagroup: true,
            ..channel
        };
        assert!(megagroup.is_listable());
    }

    #[test]
    fn test_title_fallback() {
        let mut conv = conversation(ConversationKind::Group);
        conv.name = "  ".into();
        assert_eq!(conv.title(), "(no title)");
    }

    #[test]
    fn test_display_name() {
        let p = Participant {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            ..Default::default()
        };
        assert_eq!(p.display_name(), "Ada Lovelace");

        let p = Participant {
            last_name: Some("Lovelace".into()),
            ..Default::default()
        };
        assert_eq!(p.display_name(), "Lovelace");

        assert_eq!(Participant::default().display_name(), "");
    }

    #[test]
    fn test_media_extension() {
        let media = |mime: Option<&str>| Media {
            id: 42,
            mime_type: mime.map(String::from),
        };
        assert_eq!(media(Some("image/png")).cache_file_name(), "42.png");
        assert_eq!(media(Some("IMAGE/JPEG")).cache_file_name(), "42.jpg");
        assert_eq!(media(Some("application/x-thing")).cache_file_name(), "42.jpg");
        assert_eq!(media(None).cache_file_name(), "42.jpg");
    }

    #[test]
    fn test_attachment_deserialize() {
        let msg: Message = serde_json::from_str(
            r#"{"id": 3, "text": "look", "attachment": {"kind": "photo", "id": 9, "mime_type": "image/png"}}"#,
        )
        .unwrap();
        assert_eq!(
            msg.attachment,
            Attachment::Photo(Media {
                id: 9,
                mime_type: Some("image/png".into())
            })
        );

        let msg: Message = serde_json::from_str(r#"{"id": 4}"#).unwrap();
        assert_eq!(msg.attachment, Attachment::None);
        assert_eq!(msg.text, "");
    }
}
