//! Configuration for the Lychii runtime.
//!
//! Settings are layered with figment (defaults, files, environment,
//! programmatic overrides) into a [`LychiiConfig`], then checked with
//! [`validate_config`] before a session starts.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, LychiiConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
