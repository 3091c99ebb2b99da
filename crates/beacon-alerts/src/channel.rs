//! Alert channel configuration.
//!
//! A channel is a named destination: the name doubles as a substring matcher
//! against a record's origin, and the config carries the robot webhook plus
//! what is needed to build dashboard links.

use serde::{Deserialize, Serialize};

use crate::error::{AlertError, Result};
use crate::record::LogLevel;

/// Destination and routing rules for one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Accepted level names, uppercase. Empty accepts every level.
    #[serde(default)]
    pub levels: Vec<String>,
    /// Robot webhook address. Required.
    #[serde(default)]
    pub webhook: String,
    /// Secret used to sign webhook requests. Empty disables signing.
    #[serde(default)]
    pub sign_key: String,
    /// User to mention in the alert, empty for none.
    #[serde(default)]
    pub user_id: String,
    /// Base URL of the log dashboard's discover view.
    #[serde(default)]
    pub dashboard_url: String,
    /// Index pattern the dashboard links search in.
    #[serde(default)]
    pub index_name: String,
}

impl ChannelConfig {
    /// Creates a channel posting to `webhook` that accepts every level.
    #[must_use]
    pub fn new(webhook: impl Into<String>) -> Self {
        Self {
            webhook: webhook.into(),
            ..Self::default()
        }
    }

    /// Restricts the channel to the given level names.
    #[must_use]
    pub fn with_levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.levels = levels.into_iter().map(Into::into).collect();
        self.normalize();
        self
    }

    /// Sets the signing secret.
    #[must_use]
    pub fn with_sign_key(mut self, key: impl Into<String>) -> Self {
        self.sign_key = key.into();
        self
    }

    /// Sets the user to mention.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Sets the dashboard base URL and index pattern.
    #[must_use]
    pub fn with_dashboard(mut self, url: impl Into<String>, index: impl Into<String>) -> Self {
        self.dashboard_url = url.into();
        self.index_name = index.into();
        self
    }

    /// Uppercases level names and maps aliases to canonical names.
    ///
    /// Unknown names are kept uppercased so [`validate`](Self::validate) can
    /// report them.
    pub fn normalize(&mut self) {
        for level in &mut self.levels {
            *level = match level.parse::<LogLevel>() {
                Ok(parsed) => parsed.as_str().to_string(),
                Err(_) => level.trim().to_ascii_uppercase(),
            };
        }
    }

    /// Checks that the channel can be delivered to.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Configuration` if the webhook is empty, is not an
    /// absolute http(s) URL, or a level name is unknown.
    pub fn validate(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(AlertError::configuration("channel name cannot be empty"));
        }
        if self.webhook.trim().is_empty() {
            return Err(AlertError::configuration(format!(
                "channel '{name}' has no webhook"
            )));
        }
        match url::Url::parse(&self.webhook) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(AlertError::configuration(format!(
                    "channel '{name}' webhook must use http or https, not '{}'",
                    parsed.scheme()
                )));
            }
            Err(e) => {
                return Err(AlertError::configuration(format!(
                    "channel '{name}' has an invalid webhook '{}': {e}",
                    self.webhook
                )));
            }
        }
        if let Some(bad) = self.levels.iter().find(|l| l.parse::<LogLevel>().is_err()) {
            return Err(AlertError::configuration(format!(
                "channel '{name}' lists unknown level '{bad}'"
            )));
        }
        Ok(())
    }

    /// Returns true if the channel's level filter lets `level` through.
    #[must_use]
    pub fn accepts(&self, level: LogLevel) -> bool {
        self.levels.is_empty() || self.levels.iter().any(|l| l == level.as_str())
    }
}

/// A registered channel: its name and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Channel name, matched as a substring of record origins.
    pub name: String,
    /// Destination settings.
    pub config: ChannelConfig,
}

impl Channel {
    /// Returns true if this channel should receive an event from `origin`
    /// at `level`.
    #[must_use]
    pub fn matches(&self, origin: &str, level: LogLevel) -> bool {
        origin.contains(self.name.as_str()) && self.config.accepts(level)
    }
}
