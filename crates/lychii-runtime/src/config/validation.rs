//! Configuration validation.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LychiiConfig};

/// Checks a loaded configuration before the session starts.
pub fn validate_config(config: &LychiiConfig) -> ConfigResult<()> {
    let bot = &config.bot;

    if bot.token.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.token"));
    }

    if bot.default_channel.trim().is_empty() {
        return Err(ConfigError::validation("bot.default_channel must not be empty"));
    }

    if let Some(name) = &bot.name
        && name.trim().is_empty()
    {
        return Err(ConfigError::validation("bot.name must not be empty when set"));
    }

    if bot.reconnect_timeout_secs == Some(0) {
        return Err(ConfigError::validation(
            "bot.reconnect_timeout_secs must be greater than zero",
        ));
    }

    let logging = &config.logging;
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation(
            "logging.filters contains an empty module name",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    fn valid() -> LychiiConfig {
        let mut config = LychiiConfig::default();
        config.bot.token = "xoxb-test".into();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_token() {
        let config = LychiiConfig::default();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "bot.token"
        ));
    }

    #[test]
    fn test_zero_reconnect_timeout() {
        let mut config = valid();
        config.bot.reconnect_timeout_secs = Some(0);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = valid();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("lychii.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_blank_values() {
        let mut config = valid();
        config.bot.default_channel = "  ".into();
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.bot.name = Some(String::new());
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.logging.filters.insert(String::new(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());
    }
}
