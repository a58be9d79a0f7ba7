//! Error types shared across the Lychii crates.
//!
//! Framework-level errors (plugin discovery, handler failures) live in
//! `lychii-framework`; runtime errors live in `lychii-runtime`.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors returned by [`Transport`](crate::transport::Transport) commands.
///
/// Delivery guarantees belong to the transport itself; the runtime never
/// retries a failed command.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// A command was issued before `start()`.
    #[error("transport has not been started")]
    NotStarted,

    /// The transport connection is closed and can no longer carry commands.
    #[error("transport closed: {reason}")]
    Closed {
        /// Reason for closure.
        reason: String,
    },

    /// An outbound message could not be handed to the transport.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The target channel of a send or reply could not be determined.
    #[error("message has no channel to reply to")]
    MissingChannel,
}

impl TransportError {
    /// Creates a [`TransportError::Closed`] with the given reason.
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::Closed {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport commands.
pub type TransportResult<T> = Result<T, TransportError>;
