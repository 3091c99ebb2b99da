//! Error types for the beacon-alerts crate.

use thiserror::Error;

/// Errors that can occur while configuring or delivering alerts.
#[derive(Debug, Error)]
pub enum AlertError {
    /// A channel or router setting is missing or invalid.
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The webhook could not be reached or answered with an HTTP error.
    #[error("delivery failed: {reason}")]
    Delivery {
        /// The reason delivery failed.
        reason: String,
    },

    /// The robot accepted the request but reported a non-zero status.
    #[error("webhook rejected message: code {code}: {message}")]
    Rejected {
        /// Status code returned by the robot.
        code: i64,
        /// Status message returned by the robot.
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A severity name that is not recognized.
    #[error("invalid level: {level}")]
    InvalidLevel {
        /// The name that failed to parse.
        level: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl AlertError {
    /// Shorthand for a [`AlertError::Configuration`] error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`AlertError::Delivery`] error.
    pub fn delivery(reason: impl Into<String>) -> Self {
        Self::Delivery {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for AlertError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for AlertError {
    fn from(err: reqwest::Error) -> Self {
        Self::Delivery {
            reason: err.to_string(),
        }
    }
}

/// Result type for alert operations.
pub type Result<T> = std::result::Result<T, AlertError>;
