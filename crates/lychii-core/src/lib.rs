//! # Lychii Core
//!
//! Data model and transport contract for the Lychii bot runtime.
//!
//! - **Identity**: the per-session [`IdentitySnapshot`] assembled from the
//!   authentication payload.
//! - **Messages**: [`InboundMessage`] and its subtype classification
//!   ([`MessageKind`]).
//! - **Transport**: the [`Transport`] command trait, the [`TransportEvent`]
//!   stream, and an in-process channel implementation.
//!
//! ```text
//! ┌───────────┐  TransportEvent   ┌─────────┐   &mut InboundMessage   ┌─────────┐
//! │ Transport │──────────────────▶│ Session │────────────────────────▶│ Plugins │
//! │ (client)  │◀──────────────────│         │◀────────────────────────│         │
//! └───────────┘  send / reply     └─────────┘   Transport commands    └─────────┘
//! ```

pub mod error;
pub mod identity;
pub mod message;
pub mod transport;

pub use error::{TransportError, TransportResult};
pub use identity::{AuthPayload, Channel, IdentitySnapshot, SelfInfo, Team, User, UserProfile};
pub use message::{BotInfo, InboundMessage, MessageKind, ReactionPayload};
pub use transport::{
    BoxedTransport, ChannelTransport, SessionChannels, Transport, TransportCommand,
    TransportEvent, TransportLink, create_transport_channels,
};
