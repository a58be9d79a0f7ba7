//! # Lychii
//!
//! A small plugin-driven chat bot runtime.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  events   ┌─────────┐  accept/trim  ┌───────────────┐  dispatch  ┌──────────┐
//! │ Transport │──────────▶│ Session │──────────────▶│ MentionFilter │───────────▶│ Plugins  │
//! │ (client)  │◀──────────│         │               └───────────────┘            │(patterns)│
//! └───────────┘  commands └─────────┘◀───────────────────────────────────────────└──────────┘
//! ```
//!
//! - **Transport**: the real-time messaging client; delivers events, accepts commands
//! - **Session**: the connection state machine; owns identity and plugins
//! - **MentionFilter**: keeps messages addressed to the bot and strips the address
//! - **Plugins**: ordered `(pattern, handler)` processors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lychii::prelude::*;
//!
//! struct Ping(MessageProcessor);
//!
//! impl Ping {
//!     fn create(session: SessionHandle) -> Box<dyn Plugin> {
//!         let mut processor = MessageProcessor::new();
//!         processor
//!             .register_str("^ping$", ProcessorSpec::new(move |msg, _| {
//!                 session.reply("pong", msg)?;
//!                 Ok(())
//!             }))
//!             .ok();
//!         Box::new(Ping(processor))
//!     }
//! }
//!
//! impl Plugin for Ping {
//!     fn name(&self) -> &str { "ping" }
//!     fn processor(&self) -> &MessageProcessor { &self.0 }
//! }
//!
//! export_plugin! {
//!     pub PING = PluginDescriptor::new("ping", Ping::create)
//! }
//! ```
//!
//! ## Features
//!
//! - `builtin-plugins`: register the greeter before user plugins (default)
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use lychii_core as core;
pub use lychii_framework as framework;
pub use lychii_runtime as runtime;

pub use lychii_framework::export_plugin;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use lychii::prelude::*;
/// ```
pub mod prelude {
    // Session and configuration
    pub use lychii_runtime::{
        BotConfig, ConfigLoader, LychiiConfig, RuntimeError, Session, SessionState,
    };

    // Plugin authoring
    pub use lychii_framework::{
        HandlerResult, Matches, MessageProcessor, Plugin, PluginDescriptor, ProcessorSpec,
        SessionHandle, export_plugin,
    };

    // Data model and transport
    pub use lychii_core::{
        Channel, IdentitySnapshot, InboundMessage, Transport, TransportEvent,
        create_transport_channels,
    };
}
