//! Inbound message and reaction payloads.
//!
//! An [`InboundMessage`] is created by the transport for every message event
//! and handed to the session by value. The session trims its text in place
//! before dispatch, and plugins receive it as `&mut InboundMessage`: any
//! change a processor makes is visible to the processors and plugins that run
//! after it for the same event.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::{Channel, User};

/// The bot account that posted a message, for messages sent by integrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A single inbound message event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message text; trimmed of the bot address before plugins see it.
    #[serde(default)]
    pub text: String,
    /// Text exactly as delivered, before any trimming or formatting cleanup.
    #[serde(default)]
    pub raw_text: String,
    /// Human sender, when the message was posted by a user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Bot sender, when the message was posted by an integration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<BotInfo>,
    /// Channel the message was posted in.
    #[serde(default)]
    pub channel: Channel,
    /// Event subtype; absent for plain messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// New topic, for topic-change events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Whether the message arrived in a direct-message channel.
    #[serde(default, alias = "isDM", alias = "is_dm")]
    pub is_direct_message: bool,
    /// Platform timestamp, used by transports to thread replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

impl InboundMessage {
    /// Creates a message posted by `user` in `channel`.
    ///
    /// `raw_text` starts out identical to `text`.
    pub fn new(text: impl Into<String>, user: User, channel: Channel) -> Self {
        let text = text.into();
        Self {
            raw_text: text.clone(),
            text,
            user: Some(user),
            channel,
            ..Default::default()
        }
    }

    /// Marks the message as a direct message.
    pub fn direct(mut self) -> Self {
        self.is_direct_message = true;
        self
    }

    /// Sets the subtype.
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Returns the id of whoever sent the message, user first.
    pub fn sender_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|user| user.id.as_str())
            .or_else(|| self.bot.as_ref().map(|bot| bot.id.as_str()))
    }

    /// Returns a printable sender name, user first.
    pub fn sender_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|user| user.name.as_str())
            .or_else(|| self.bot.as_ref().map(|bot| bot.name.as_str()))
            .unwrap_or("unknown")
    }

    /// Classifies the subtype of this message.
    pub fn kind(&self) -> MessageKind {
        MessageKind::classify(self.subtype.as_deref())
    }
}

// =============================================================================
// Subtype classification
// =============================================================================

/// What a message event represents, derived from its subtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// A plain message (`message` or no subtype).
    Message,
    /// A message posted by an integration (`bot_message`).
    BotMessage,
    /// Someone joined a channel or group.
    Joined,
    /// Someone left a channel or group.
    Left,
    /// Someone changed the channel or group topic.
    TopicChanged,
    /// Any other subtype (edits, deletions, file shares, ...).
    Other(String),
}

impl MessageKind {
    /// Maps a raw subtype onto a [`MessageKind`].
    pub fn classify(subtype: Option<&str>) -> Self {
        match subtype {
            None | Some("message") => Self::Message,
            Some("bot_message") => Self::BotMessage,
            Some("channel_join" | "group_join") => Self::Joined,
            Some("channel_leave" | "group_leave") => Self::Left,
            Some("channel_topic" | "group_topic") => Self::TopicChanged,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    /// Returns `true` for kinds that are routed to plugins.
    pub fn is_routed(&self) -> bool {
        matches!(self, Self::Message | Self::BotMessage)
    }

    /// Returns `true` for join/leave/topic notifications.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::Joined | Self::Left | Self::TopicChanged)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => f.write_str("message"),
            Self::BotMessage => f.write_str("bot_message"),
            Self::Joined => f.write_str("join"),
            Self::Left => f.write_str("leave"),
            Self::TopicChanged => f.write_str("topic"),
            Self::Other(subtype) => f.write_str(subtype),
        }
    }
}

// =============================================================================
// Reactions
// =============================================================================

/// A reaction added to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionPayload {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub reaction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_user: Option<String>,
    #[serde(default)]
    pub item: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_subtypes() {
        assert_eq!(MessageKind::classify(None), MessageKind::Message);
        assert_eq!(MessageKind::classify(Some("message")), MessageKind::Message);
        assert_eq!(
            MessageKind::classify(Some("bot_message")),
            MessageKind::BotMessage
        );
        assert_eq!(
            MessageKind::classify(Some("group_join")),
            MessageKind::Joined
        );
        assert_eq!(
            MessageKind::classify(Some("channel_leave")),
            MessageKind::Left
        );
        assert_eq!(
            MessageKind::classify(Some("group_topic")),
            MessageKind::TopicChanged
        );
        assert_eq!(
            MessageKind::classify(Some("message_changed")),
            MessageKind::Other("message_changed".into())
        );
    }

    #[test]
    fn test_routed_and_informational() {
        assert!(MessageKind::Message.is_routed());
        assert!(MessageKind::BotMessage.is_routed());
        assert!(!MessageKind::Joined.is_routed());
        assert!(MessageKind::TopicChanged.is_informational());
        assert!(!MessageKind::Other("file_share".into()).is_routed());
        assert!(!MessageKind::Other("file_share".into()).is_informational());
    }

    #[test]
    fn test_deserialize_accepts_dm_aliases() {
        let msg: InboundMessage = serde_json::from_value(json!({
            "text": "hello",
            "user": { "id": "U2", "name": "bob" },
            "channel": { "id": "D1" },
            "isDM": true
        }))
        .unwrap();

        assert!(msg.is_direct_message);
        assert_eq!(msg.sender_id(), Some("U2"));
        assert_eq!(msg.kind(), MessageKind::Message);
    }

    #[test]
    fn test_sender_falls_back_to_bot() {
        let msg: InboundMessage = serde_json::from_value(json!({
            "text": "deploy finished",
            "bot": { "id": "B7", "name": "ci" },
            "subtype": "bot_message"
        }))
        .unwrap();

        assert_eq!(msg.sender_id(), Some("B7"));
        assert_eq!(msg.sender_name(), "ci");
        assert_eq!(msg.kind(), MessageKind::BotMessage);
    }
}
