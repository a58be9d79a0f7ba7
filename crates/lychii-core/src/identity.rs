//! Identity snapshot: who the bot is, which team it joined, and what it can see.
//!
//! The real-time API delivers an [`AuthPayload`] once per authenticated
//! session. [`IdentitySnapshot::assemble`] turns it into the read-only view
//! the session and plugins consult for the rest of that session. A new
//! authentication replaces the snapshot wholesale; it is never patched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Payload types
// =============================================================================

/// The bot's own account as reported by the authentication payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfInfo {
    /// User id of the bot account.
    pub id: String,
    /// Display name; also the word users address the bot with.
    #[serde(default)]
    pub name: String,
    /// Bot id, resolved from the user directory during assembly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

/// The team (workspace) the bot is connected to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Profile block of a [`User`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Present only on bot users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

/// A member of the team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile: UserProfile,
}

/// A public channel or private group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    /// Direct-message channels carry no name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
}

impl Channel {
    /// Creates a named channel.
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            members: None,
        }
    }

    /// Returns the channel name, or its id when it has none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Raw authentication payload, as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    #[serde(rename = "self")]
    pub self_info: SelfInfo,
    #[serde(default)]
    pub team: Team,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub groups: Vec<Channel>,
}

// =============================================================================
// IdentitySnapshot
// =============================================================================

/// Immutable per-session record of self, team, users and channels.
///
/// Channels are keyed by name; when two channels share a name the later one
/// in the payload wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySnapshot {
    self_info: SelfInfo,
    team: Team,
    users: Vec<User>,
    channels: HashMap<String, Channel>,
    default_channel: Option<Channel>,
}

impl IdentitySnapshot {
    /// Builds a snapshot from an authentication payload.
    ///
    /// `default_channel` names the private group used for status
    /// announcements. The bot id and the default channel are resolved on a
    /// best-effort basis: when either is missing the corresponding field is
    /// left unset and callers decide how to degrade.
    pub fn assemble(payload: AuthPayload, default_channel: &str) -> Self {
        let AuthPayload {
            mut self_info,
            team,
            users,
            channels,
            groups,
        } = payload;

        let channels = channels
            .into_iter()
            .filter_map(|channel| channel.name.clone().map(|name| (name, channel)))
            .collect();

        self_info.bot_id = users
            .iter()
            .find(|user| user.id == self_info.id)
            .and_then(|user| user.profile.bot_id.clone());

        let default_channel = groups
            .into_iter()
            .find(|group| group.name.as_deref() == Some(default_channel));

        Self {
            self_info,
            team,
            users,
            channels,
            default_channel,
        }
    }

    /// Returns the bot's own account.
    pub fn self_info(&self) -> &SelfInfo {
        &self.self_info
    }

    /// Returns the bot's user id.
    pub fn self_id(&self) -> &str {
        &self.self_info.id
    }

    /// Returns the bot's display name.
    pub fn self_name(&self) -> &str {
        &self.self_info.name
    }

    /// Returns the resolved bot id, if the user directory contained one.
    pub fn bot_id(&self) -> Option<&str> {
        self.self_info.bot_id.as_deref()
    }

    /// Returns the team the session belongs to.
    pub fn team(&self) -> &Team {
        &self.team
    }

    /// Returns every user in payload order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Looks a user up by id.
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    /// Returns the channel map, keyed by channel name.
    pub fn channels(&self) -> &HashMap<String, Channel> {
        &self.channels
    }

    /// Looks a channel up by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Returns the status-announcement channel, if it was found.
    pub fn default_channel(&self) -> Option<&Channel> {
        self.default_channel.as_ref()
    }

    /// Returns `true` when `id` is the bot's own user id or bot id.
    pub fn is_self(&self, id: &str) -> bool {
        id == self.self_info.id || self.bot_id() == Some(id)
    }
}
