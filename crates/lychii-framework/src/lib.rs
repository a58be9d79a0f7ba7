//! # Lychii Framework
//!
//! Message routing and plugin dispatch for Lychii bots.
//!
//! This layer provides:
//! - [`MentionFilter`]: decides whether a message is addressed to the bot
//!   and strips the address
//! - [`MessageProcessor`]: ordered `(pattern, handler)` entries owned by a
//!   plugin; every matching entry runs
//! - [`Plugin`] and [`PluginRegistry`]: the plugin contract and the ordered
//!   registry that dispatches accepted messages
//! - [`PluginLoader`]: discovery of plugins from a directory, resolved
//!   against the compiled-in catalog
//! - [`SessionHandle`]: session state handed to plugins at construction
//!
//! ```text
//! InboundMessage ─► MentionFilter::accept ─► MentionFilter::trim
//!                                                   │
//!                  ┌────────────────────────────────┘
//!                  ▼
//!          PluginRegistry::dispatch ─► plugin 1 ─► MessageProcessor (A, B, ...)
//!                                  ─► plugin 2 ─► MessageProcessor (...)
//! ```

pub mod error;
pub mod mention;
pub mod plugin;
pub mod processor;
pub mod session;

pub use error::{HandlerError, HandlerResult, PluginError, PluginResult};
pub use mention::MentionFilter;
pub use plugin::{
    CatalogLoader, PLUGIN_CATALOG, Plugin, PluginDescriptor, PluginLoader, PluginRegistry,
    PluginState,
};
pub use processor::{HandlerFn, IntoProcessor, Matches, MessageProcessor, ProcessorSpec};
pub use session::SessionHandle;

#[doc(hidden)]
pub use linkme as __linkme;
