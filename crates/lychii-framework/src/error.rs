//! Error types for the Lychii framework.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error returned by a processor handler or pre-hook.
///
/// Handler failures are contained by the processor: they are logged and the
/// remaining processors still run.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by handlers and pre-hooks.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors raised while discovering, registering or initialising plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin directory could not be read. Fatal at start-up.
    #[error("failed to read plugin directory '{}': {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A plugin manifest exists but could not be parsed.
    #[error("invalid plugin manifest '{}': {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    /// An explicit export names a plugin that is not compiled in.
    #[error("no plugin named '{0}' is available")]
    UnknownPlugin(String),

    /// A plugin's `init` hook failed.
    #[error("plugin '{plugin}' failed to initialise: {source}")]
    Init {
        plugin: String,
        #[source]
        source: HandlerError,
    },

    /// A processor pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl PluginError {
    /// Returns `true` for errors that must abort start-up.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Discovery { .. } | Self::UnknownPlugin(_))
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
