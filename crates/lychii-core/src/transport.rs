//! Transport contract between the session and the real-time messaging client.
//!
//! The real-time client is an external collaborator. It reaches the session
//! through two one-way paths:
//!
//! ```text
//!            TransportEvent (authenticated, connected, message, ...)
//! client ─────────────────────────────────────────────────────▶ session
//! client ◀───────────────────────────────────────────────────── session
//!            Transport commands (start, disconnect, send, reply)
//! ```
//!
//! Commands are non-blocking. An implementation queues the work and returns
//! immediately, so plugin handlers can issue them from inside a dispatch turn
//! without stalling the event loop. Delivery and retries are the client's
//! business.
//!
//! [`create_transport_channels`] builds an in-process implementation backed by
//! tokio channels, used by the console demo and by tests.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{TransportError, TransportResult};
use crate::identity::{AuthPayload, Channel};
use crate::message::{InboundMessage, ReactionPayload};

// =============================================================================
// Events
// =============================================================================

/// An event delivered by the transport to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    /// The client authenticated; carries the identity payload.
    Authenticated(AuthPayload),
    /// The real-time connection is confirmed.
    Connected,
    /// A message was posted somewhere the bot can see.
    Message(InboundMessage),
    /// A reaction was added to an item.
    ReactionAdded(ReactionPayload),
    /// The real-time connection dropped.
    Disconnected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl TransportEvent {
    /// Returns a short, stable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticated(_) => "authenticated",
            Self::Connected => "connected",
            Self::Message(_) => "message",
            Self::ReactionAdded(_) => "reaction_added",
            Self::Disconnected { .. } => "disconnected",
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// The commands a session (and its plugins) may issue to the transport.
///
/// Implementations must be cheap and non-blocking: queue, then return.
pub trait Transport: Send + Sync + 'static {
    /// Opens the real-time connection.
    fn start(&self) -> TransportResult<()>;

    /// Closes the real-time connection.
    fn disconnect(&self) -> TransportResult<()>;

    /// Posts `text` to `channel`.
    fn send(&self, text: &str, channel: &Channel) -> TransportResult<()>;

    /// Posts `text` as a reply to `original`, in the channel it came from.
    fn reply(&self, text: &str, original: &InboundMessage) -> TransportResult<()> {
        if original.channel.id.is_empty() {
            return Err(TransportError::MissingChannel);
        }
        self.send(text, &original.channel)
    }
}

/// A shared transport trait object.
pub type BoxedTransport = Arc<dyn Transport>;

/// A command as observed on the far side of a [`ChannelTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// `start()` was called.
    Start,
    /// `disconnect()` was called.
    Disconnect,
    /// `send()` was called.
    Send { text: String, channel: Channel },
    /// `reply()` was called.
    Reply {
        text: String,
        channel: Channel,
        thread_ts: Option<String>,
    },
}

// =============================================================================
// Channel-backed transport
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Idle,
    Started,
    Closed,
}

/// A [`Transport`] that forwards every command over an unbounded channel.
///
/// Commands issued before `start()` fail with [`TransportError::NotStarted`];
/// commands issued after `disconnect()` fail with [`TransportError::Closed`].
#[derive(Debug)]
pub struct ChannelTransport {
    commands: mpsc::UnboundedSender<TransportCommand>,
    state: Mutex<LinkState>,
}

impl ChannelTransport {
    fn forward(&self, command: TransportCommand) -> TransportResult<()> {
        trace!(?command, "Forwarding transport command");
        self.commands.send(command).map_err(|rejected| match rejected.0 {
            TransportCommand::Send { channel, .. } | TransportCommand::Reply { channel, .. } => {
                TransportError::SendFailed(format!(
                    "command receiver dropped, message to {} lost",
                    channel.display_name()
                ))
            }
            TransportCommand::Start | TransportCommand::Disconnect => {
                TransportError::closed("command receiver dropped")
            }
        })
    }

    fn ensure_started(&self) -> TransportResult<()> {
        match *self.state.lock() {
            LinkState::Started => Ok(()),
            LinkState::Idle => Err(TransportError::NotStarted),
            LinkState::Closed => Err(TransportError::closed("transport disconnected")),
        }
    }
}

impl Transport for ChannelTransport {
    fn start(&self) -> TransportResult<()> {
        {
            let mut state = self.state.lock();
            if *state == LinkState::Started {
                debug!("Transport already started");
                return Ok(());
            }
            *state = LinkState::Started;
        }
        self.forward(TransportCommand::Start)
    }

    fn disconnect(&self) -> TransportResult<()> {
        *self.state.lock() = LinkState::Closed;
        self.forward(TransportCommand::Disconnect)
    }

    fn send(&self, text: &str, channel: &Channel) -> TransportResult<()> {
        self.ensure_started()?;
        self.forward(TransportCommand::Send {
            text: text.to_string(),
            channel: channel.clone(),
        })
    }

    fn reply(&self, text: &str, original: &InboundMessage) -> TransportResult<()> {
        self.ensure_started()?;
        if original.channel.id.is_empty() {
            return Err(TransportError::MissingChannel);
        }
        self.forward(TransportCommand::Reply {
            text: text.to_string(),
            channel: original.channel.clone(),
            thread_ts: original.ts.clone(),
        })
    }
}

/// Session side of a channel transport: the command sink and the event stream.
pub struct SessionChannels {
    /// Transport handed to the session and, through it, to plugins.
    pub transport: Arc<ChannelTransport>,
    /// Events delivered by the client.
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Client side of a channel transport.
pub struct TransportLink {
    /// Sender for events towards the session.
    pub events: mpsc::Sender<TransportEvent>,
    /// Receiver for commands issued by the session.
    pub commands: mpsc::UnboundedReceiver<TransportCommand>,
}

/// Creates a connected pair of session-side and client-side channels.
pub fn create_transport_channels(buffer_size: usize) -> (SessionChannels, TransportLink) {
    let (event_tx, event_rx) = mpsc::channel(buffer_size);
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let session = SessionChannels {
        transport: Arc::new(ChannelTransport {
            commands: command_tx,
            state: Mutex::new(LinkState::Idle),
        }),
        events: event_rx,
    };

    let link = TransportLink {
        events: event_tx,
        commands: command_rx,
    };

    (session, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::User;
    use serde_json::json;

    #[test]
    fn test_commands_require_start() {
        let (session, _link) = create_transport_channels(4);
        let channel = Channel::named("C1", "general");

        assert!(matches!(
            session.transport.send("hi", &channel),
            Err(TransportError::NotStarted)
        ));
    }

    #[test]
    fn test_commands_are_forwarded_in_order() {
        let (session, mut link) = create_transport_channels(4);
        let transport = session.transport;
        let channel = Channel::named("C1", "general");

        transport.start().unwrap();
        transport.send("one", &channel).unwrap();
        let mut original = InboundMessage::new("hi", User::default(), channel.clone());
        original.ts = Some("1.0".into());
        transport.reply("two", &original).unwrap();
        transport.disconnect().unwrap();

        assert_eq!(link.commands.try_recv().unwrap(), TransportCommand::Start);
        assert_eq!(
            link.commands.try_recv().unwrap(),
            TransportCommand::Send {
                text: "one".into(),
                channel: channel.clone()
            }
        );
        assert_eq!(
            link.commands.try_recv().unwrap(),
            TransportCommand::Reply {
                text: "two".into(),
                channel,
                thread_ts: Some("1.0".into())
            }
        );
        assert_eq!(
            link.commands.try_recv().unwrap(),
            TransportCommand::Disconnect
        );
    }

    #[test]
    fn test_commands_after_disconnect_fail() {
        let (session, _link) = create_transport_channels(4);
        let transport = session.transport;
        transport.start().unwrap();
        transport.disconnect().unwrap();

        let result = transport.send("late", &Channel::named("C1", "general"));
        assert!(matches!(result, Err(TransportError::Closed { .. })));
    }

    #[test]
    fn test_send_to_dropped_client_fails() {
        let (session, link) = create_transport_channels(4);
        let transport = session.transport;
        transport.start().unwrap();
        drop(link);

        let channel = Channel::named("C1", "general");
        assert!(matches!(
            transport.send("lost", &channel),
            Err(TransportError::SendFailed(_))
        ));
        let original = InboundMessage::new("hi", User::default(), channel);
        assert!(matches!(
            transport.reply("lost", &original),
            Err(TransportError::SendFailed(_))
        ));
        assert!(matches!(
            transport.disconnect(),
            Err(TransportError::Closed { .. })
        ));
    }

    #[test]
    fn test_reply_without_channel_fails() {
        let (session, _link) = create_transport_channels(4);
        session.transport.start().unwrap();

        let original = InboundMessage::default();
        assert!(matches!(
            session.transport.reply("x", &original),
            Err(TransportError::MissingChannel)
        ));
    }

    #[test]
    fn test_event_wire_format() {
        let event: TransportEvent = serde_json::from_value(json!({
            "type": "message",
            "text": "lychii ping",
            "user": { "id": "U2", "name": "bob" },
            "channel": { "id": "C1", "name": "general" }
        }))
        .unwrap();
        assert_eq!(event.name(), "message");

        let event: TransportEvent =
            serde_json::from_value(json!({ "type": "disconnected" })).unwrap();
        assert_eq!(event, TransportEvent::Disconnected { reason: None });
    }

    #[tokio::test]
    async fn test_events_reach_session_side() {
        let (mut session, link) = create_transport_channels(4);
        link.events.send(TransportEvent::Connected).await.unwrap();

        assert_eq!(session.events.recv().await, Some(TransportEvent::Connected));
    }
}
