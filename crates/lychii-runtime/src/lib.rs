//! Lychii Runtime - session controller for the Lychii bot runtime.
//!
//! This crate provides:
//! - The [`Session`] state machine that drives one bot over one transport
//! - Configuration loading and validation ([`config`])
//! - Logging setup ([`logging`])
//!
//! ```ignore
//! use lychii_core::create_transport_channels;
//! use lychii_runtime::{Session, config, logging};
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     let config = config::load_config().expect("config");
//!     logging::init_from_config(&config.logging);
//!
//!     let (channels, link) = create_transport_channels(64);
//!     // hand `link` to the real-time client here
//!
//!     let mut session = Session::builder(config.bot, channels.transport)
//!         .build()
//!         .expect("plugins");
//!     match session.run(channels.events).await {
//!         Ok(()) => std::process::ExitCode::SUCCESS,
//!         Err(e) => e.exit_code(),
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

// Re-exports
pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, LychiiConfig,
    validate_config,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use session::{Session, SessionBuilder, SessionState, shutdown_signal};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for plugin and binary code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
