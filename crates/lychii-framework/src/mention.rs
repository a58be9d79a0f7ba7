//! Decides whether a message is addressed to the bot and strips the address.
//!
//! A message is accepted when, checked in order:
//!
//! 1. its sender is not the bot itself (user id or bot id), and
//! 2. it is a direct message, or
//! 3. its text opens with the bot's name, optionally `@`-prefixed, followed
//!    by whitespace. The comparison is case-insensitive.
//!
//! Accepted messages are then trimmed: surrounding whitespace is removed,
//! followed by at most one leading address. A mention in the middle of a
//! sentence is never treated as an address.
//!
//! Without a name there is nothing to address, so only direct messages are
//! accepted.

use regex::Regex;
use tracing::{trace, warn};

use lychii_core::{IdentitySnapshot, InboundMessage};

use crate::error::PluginResult;

/// Address matcher built from the bot's name.
#[derive(Debug, Clone)]
pub struct MentionFilter {
    bot_name: String,
    patterns: Option<AddressPatterns>,
}

#[derive(Debug, Clone)]
struct AddressPatterns {
    address: Regex,
    prefix: Regex,
}

impl MentionFilter {
    /// Builds the filter for `bot_name`. The name is matched literally.
    pub fn new(bot_name: &str) -> PluginResult<Self> {
        if bot_name.trim().is_empty() {
            warn!("Bot has no name; only direct messages will be handled");
            return Ok(Self {
                bot_name: String::new(),
                patterns: None,
            });
        }

        let escaped = regex::escape(bot_name);
        Ok(Self {
            bot_name: bot_name.to_string(),
            patterns: Some(AddressPatterns {
                address: Regex::new(&format!(r"(?i)^(@?{escaped}\s)"))?,
                prefix: Regex::new(&format!(r"(?i)^@?{escaped}(\s|$)"))?,
            }),
        })
    }

    /// Returns the name this filter was built for.
    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    /// Returns `true` if `message` should be routed to plugins.
    pub fn accept(&self, message: &InboundMessage, identity: &IdentitySnapshot) -> bool {
        let from_self = [
            message.user.as_ref().map(|user| user.id.as_str()),
            message.bot.as_ref().map(|bot| bot.id.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|id| !id.is_empty() && identity.is_self(id));

        if from_self {
            trace!(sender = ?message.sender_id(), "Ignoring message sent by the bot itself");
            return false;
        }

        message.is_direct_message
            || self
                .patterns
                .as_ref()
                .is_some_and(|p| p.address.is_match(&message.text))
    }

    /// Trims whitespace and removes one leading address from `message.text`.
    ///
    /// A message that consists only of the address ends up with empty text.
    pub fn trim(&self, message: &mut InboundMessage) {
        let trimmed = message.text.trim();
        message.text = match &self.patterns {
            Some(p) => p.prefix.replace(trimmed, "").into_owned(),
            None => trimmed.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lychii_core::{AuthPayload, BotInfo, Channel, SelfInfo, User, UserProfile};

    fn identity() -> IdentitySnapshot {
        let payload = AuthPayload {
            self_info: SelfInfo {
                id: "U1".into(),
                name: "bot".into(),
                bot_id: None,
            },
            users: vec![User {
                id: "U1".into(),
                name: "bot".into(),
                profile: UserProfile {
                    bot_id: Some("B1".into()),
                },
            }],
            ..Default::default()
        };
        IdentitySnapshot::assemble(payload, "private-integration")
    }

    fn from(user: &str, text: &str) -> InboundMessage {
        InboundMessage::new(
            text,
            User {
                id: user.into(),
                ..Default::default()
            },
            Channel::named("C1", "general"),
        )
    }

    #[test]
    fn test_rejects_messages_from_self() {
        let filter = MentionFilter::new("bot").unwrap();
        let identity = identity();

        assert!(!filter.accept(&from("U1", "bot hi"), &identity));
        assert!(!filter.accept(&from("U1", "anything").direct(), &identity));

        let mut via_bot = InboundMessage::default().direct();
        via_bot.text = "bot hi".into();
        via_bot.bot = Some(BotInfo {
            id: "B1".into(),
            name: "bot".into(),
        });
        assert!(!filter.accept(&via_bot, &identity));
    }

    #[test]
    fn test_accepts_any_direct_message() {
        let filter = MentionFilter::new("bot").unwrap();
        let identity = identity();

        for text in ["", "hello", "hello bot", "   "] {
            assert!(filter.accept(&from("U2", text).direct(), &identity));
        }
    }

    #[test]
    fn test_channel_messages_need_address_prefix() {
        let filter = MentionFilter::new("bot").unwrap();
        let identity = identity();

        assert!(!filter.accept(&from("U2", "hello bot"), &identity));
        assert!(!filter.accept(&from("U2", "botany rocks"), &identity));
        assert!(!filter.accept(&from("U2", "bot"), &identity));
        assert!(filter.accept(&from("U2", "bot hello"), &identity));
        assert!(filter.accept(&from("U2", "@bot hello"), &identity));
        assert!(filter.accept(&from("U2", "BOT hello"), &identity));
        assert!(filter.accept(&from("U2", "@Bot\thello"), &identity));
    }

    #[test]
    fn test_trim_removes_exactly_the_prefix() {
        let filter = MentionFilter::new("bot").unwrap();

        for (input, expected) in [
            ("bot hi there", "hi there"),
            ("@BOT hi there", "hi there"),
            ("  bot hi there  ", "hi there"),
            ("bot bot twice", "bot twice"),
            ("hello bot", "hello bot"),
            ("bot ", ""),
            ("@bot", ""),
        ] {
            let mut msg = from("U2", input);
            filter.trim(&mut msg);
            assert_eq!(msg.text, expected, "trimming {input:?}");
            assert_eq!(msg.raw_text, input);
        }
    }

    #[test]
    fn test_nameless_bot_accepts_only_direct_messages() {
        let filter = MentionFilter::new("").unwrap();
        let identity = identity();

        assert!(!filter.accept(&from("U2", " deploy prod"), &identity));
        assert!(!filter.accept(&from("U2", "@ deploy prod"), &identity));
        assert!(filter.accept(&from("U2", " deploy prod").direct(), &identity));

        let mut msg = from("U2", "  @here deploy ");
        filter.trim(&mut msg);
        assert_eq!(msg.text, "@here deploy");
    }

    #[test]
    fn test_name_is_matched_literally() {
        let filter = MentionFilter::new("c++").unwrap();
        let identity = identity();

        assert!(filter.accept(&from("U2", "c++ build"), &identity));
        assert!(!filter.accept(&from("U2", "cc build"), &identity));
    }
}
