//! Alert router configuration.
//!
//! Loaded once at startup from TOML:
//!
//! ```toml
//! min_level = "NOTICE"
//! dispatch = "background"
//!
//! [channels.default_api]
//! webhook = "https://open.example.com/hook/abc"
//!
//! [channels.orders]
//! levels = ["error"]
//! webhook = "https://open.example.com/hook/def"
//! sign_key = "secret"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelConfig;
use crate::error::{AlertError, Result};
use crate::record::LogLevel;

/// Channel used for command-line records when no named channel matches.
pub const DEFAULT_COMMAND_CHANNEL: &str = "default_command";

/// Channel used for request records when no named channel matches.
pub const DEFAULT_API_CHANNEL: &str = "default_api";

/// Default webhook request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Where delivery runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    /// Deliver on the thread that emitted the record.
    #[default]
    Inline,
    /// Hand delivery to a worker thread; the emitter never waits on the network.
    Background,
}

/// Top-level alert configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Records below this level are dropped.
    #[serde(default = "default_min_level")]
    pub min_level: LogLevel,
    /// Fallback channel for records without a URL.
    #[serde(default = "default_command_channel")]
    pub default_command_channel: String,
    /// Fallback channel for records with a URL.
    #[serde(default = "default_api_channel")]
    pub default_api_channel: String,
    /// Delivery mode.
    #[serde(default)]
    pub dispatch: Dispatch,
    /// Webhook request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Channels by name. Registered in name order.
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
}

fn default_min_level() -> LogLevel {
    LogLevel::Notice
}

fn default_command_channel() -> String {
    DEFAULT_COMMAND_CHANNEL.to_string()
}

fn default_api_channel() -> String {
    DEFAULT_API_CHANNEL.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            min_level: default_min_level(),
            default_command_channel: default_command_channel(),
            default_api_channel: default_api_channel(),
            dispatch: Dispatch::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            channels: BTreeMap::new(),
        }
    }
}

impl AlertsConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AlertError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// Level names are normalized before validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a channel is unusable.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| AlertError::Config(format!("invalid TOML: {e}")))?;

        for channel in config.channels.values_mut() {
            channel.normalize();
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Configuration` if any value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(AlertError::configuration("timeout_secs must be positive"));
        }
        if self.default_command_channel.is_empty() || self.default_api_channel.is_empty() {
            return Err(AlertError::configuration(
                "default channel names cannot be empty",
            ));
        }
        for (name, channel) in &self.channels {
            channel.validate(name)?;
        }
        Ok(())
    }

    /// Returns the fallback channel name for a record.
    #[must_use]
    pub fn default_channel(&self, has_url: bool) -> &str {
        if has_url {
            &self.default_api_channel
        } else {
            &self.default_command_channel
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
min_level = "warning"
dispatch = "background"
timeout_secs = 3

[channels.default_api]
webhook = "https://open.example.com/hook/api"

[channels.default_command]
webhook = "https://open.example.com/hook/cmd"
user_id = "ou_oncall"

[channels.orders]
levels = ["error", "critical"]
webhook = "https://open.example.com/hook/orders"
sign_key = "s3cret"
dashboard_url = "https://kibana.example.com/app/discover"
index_name = "app-logs-*"
"#;

    #[test]
    fn parse_full_config() {
        let config = AlertsConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.min_level, LogLevel::Warning);
        assert_eq!(config.dispatch, Dispatch::Background);
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.channels.len(), 3);

        let orders = &config.channels["orders"];
        assert_eq!(orders.levels, vec!["ERROR", "CRITICAL"]);
        assert_eq!(orders.sign_key, "s3cret");
        assert_eq!(orders.index_name, "app-logs-*");
    }

    #[test]
    fn defaults_apply() {
        let config = AlertsConfig::from_toml("").unwrap();
        assert_eq!(config, AlertsConfig::default());
        assert_eq!(config.min_level, LogLevel::Notice);
        assert_eq!(config.dispatch, Dispatch::Inline);
        assert_eq!(config.default_channel(true), "default_api");
        assert_eq!(config.default_channel(false), "default_command");
    }

    #[test]
    fn missing_webhook_is_rejected() {
        let err = AlertsConfig::from_toml(
            r#"
[channels.orders]
levels = ["error"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AlertError::Configuration { .. }));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = AlertsConfig::from_toml("min_level = ").unwrap_err();
        assert!(matches!(err, AlertError::Config(_)));
    }

    #[test]
    fn unknown_min_level_is_rejected() {
        assert!(AlertsConfig::from_toml("min_level = \"loud\"").is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(AlertsConfig::from_toml("timeout_secs = 0").is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AlertsConfig::from_file(file.path()).unwrap();
        assert_eq!(config.channels.len(), 3);
    }

    #[test]
    fn from_file_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = AlertsConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
