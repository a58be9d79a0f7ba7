//! Runtime error types.

use std::process::ExitCode;
use std::time::Duration;

use thiserror::Error;

use lychii_core::TransportError;
use lychii_framework::PluginError;

use crate::config::ConfigError;

/// Errors that end a session or prevent it from starting.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plugin discovery failed.
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// A transport command failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The connection dropped and auto-reconnect is disabled.
    #[error("Connection lost: {reason}")]
    ConnectionLost { reason: String },

    /// The transport did not recover within the configured timeout.
    #[error("Transport did not reconnect within {0:?}")]
    ReconnectTimedOut(Duration),

    /// `start` was called on a session that is not disconnected.
    #[error("Session already started")]
    AlreadyStarted,

    /// The transport dropped its event sender.
    #[error("Transport event stream closed")]
    EventStreamClosed,
}

impl RuntimeError {
    /// Numeric exit status; never zero.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Config(_) => 78,
            Self::Plugin(_) => 3,
            Self::ConnectionLost { .. } | Self::ReconnectTimedOut(_) => 2,
            Self::Transport(_) | Self::AlreadyStarted | Self::EventStreamClosed => 1,
        }
    }

    /// Process exit code for a session that ended with this error.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
