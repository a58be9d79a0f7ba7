//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LychiiConfig {
    /// Session settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// Settings consumed by the session controller.
#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Authentication token for the real-time API.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    /// Name users address the bot with. Defaults to the name reported at
    /// authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Private group used for status announcements.
    #[serde(default = "default_channel")]
    pub default_channel: String,

    /// Wait for the transport to recover after a disconnect instead of exiting.
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,

    /// Directory of user plugins, loaded after the built-in ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_dir_path: Option<PathBuf>,

    /// How long to wait for the transport to recover. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_timeout_secs: Option<u64>,

    /// Register the compiled-in default plugins.
    #[serde(default = "default_true")]
    pub builtin_plugins: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            name: None,
            default_channel: default_channel(),
            auto_reconnect: true,
            plugin_dir_path: None,
            reconnect_timeout_secs: None,
            builtin_plugins: true,
        }
    }
}

impl BotConfig {
    /// Reconnect timeout as a [`Duration`].
    pub fn reconnect_timeout(&self) -> Option<Duration> {
        self.reconnect_timeout_secs.map(Duration::from_secs)
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("name", &self.name)
            .field("default_channel", &self.default_channel)
            .field("auto_reconnect", &self.auto_reconnect)
            .field("plugin_dir_path", &self.plugin_dir_path)
            .field("reconnect_timeout_secs", &self.reconnect_timeout_secs)
            .field("builtin_plugins", &self.builtin_plugins)
            .finish()
    }
}

fn default_channel() -> String {
    "private-integration".to_string()
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Line format of log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Destination of log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Rotation policy for file output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `lychii_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bot_defaults() {
        let bot: BotConfig = serde_json::from_value(json!({ "token": "xoxb" })).unwrap();

        assert_eq!(bot.default_channel, "private-integration");
        assert!(bot.auto_reconnect);
        assert!(bot.builtin_plugins);
        assert_eq!(bot.reconnect_timeout(), None);
    }

    #[test]
    fn test_debug_hides_token() {
        let bot = BotConfig {
            token: "xoxb-secret".into(),
            ..Default::default()
        };
        let printed = format!("{bot:?}");
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("verbose".parse::<LogLevel>().is_err());

        let logging: LoggingConfig = serde_json::from_value(json!({
            "level": "debug",
            "format": "pretty",
            "filters": { "lychii_framework": "trace" }
        }))
        .unwrap();
        assert_eq!(logging.level.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(logging.format, LogFormat::Pretty);
        assert_eq!(logging.filters["lychii_framework"], LogLevel::Trace);
    }
}
