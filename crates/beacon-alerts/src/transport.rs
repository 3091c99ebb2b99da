//! Notification transports.
//!
//! This module provides the [`NotificationTransport`] trait the router
//! delivers through, and [`WebhookRobotTransport`], which posts signed JSON to
//! chat group robot webhooks.

use std::fmt;
use std::time::Duration;

use beacon_pool::{PoolError, ResourcePool};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::channel::ChannelConfig;
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::{AlertError, Result};
use crate::message::OutboundMessage;
use crate::sign::sign;

/// Delivers a message to a channel's destination.
///
/// Implement this trait to deliver alerts somewhere other than a group robot.
pub trait NotificationTransport: Send + Sync + fmt::Debug {
    /// Sends `message` to the destination described by `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination could not be reached or rejected
    /// the message.
    fn deliver(&self, destination: &ChannelConfig, message: &OutboundMessage) -> Result<()>;
}

/// Response body of a group robot.
///
/// Older robots answer with `StatusCode`/`StatusMessage`, newer ones with
/// `code`/`msg`; some send both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RobotResponse {
    /// New-style status code.
    #[serde(default)]
    pub code: Option<i64>,
    /// New-style status message.
    #[serde(default)]
    pub msg: Option<String>,
    /// Legacy status code.
    #[serde(default, rename = "StatusCode")]
    pub status_code: Option<i64>,
    /// Legacy status message.
    #[serde(default, rename = "StatusMessage")]
    pub status_message: Option<String>,
    /// Response payload, if any.
    #[serde(default)]
    pub data: Value,
}

impl RobotResponse {
    /// Returns the status code; zero means success.
    #[must_use]
    pub fn status(&self) -> i64 {
        self.code.or(self.status_code).unwrap_or(0)
    }

    /// Returns the status message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.msg
            .as_deref()
            .or(self.status_message.as_deref())
            .unwrap_or_default()
    }

    /// Converts a non-zero status into [`AlertError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Rejected` if the status is not zero.
    pub fn into_result(self) -> Result<Self> {
        match self.status() {
            0 => Ok(self),
            code => Err(AlertError::Rejected {
                code,
                message: self.message().to_string(),
            }),
        }
    }
}

/// A client bound to one group robot webhook.
pub struct GroupRobot {
    webhook: String,
    client: reqwest::blocking::Client,
}

impl GroupRobot {
    /// Creates a robot client for `webhook`.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Configuration` if the webhook is not an absolute
    /// http(s) URL, or `AlertError::Delivery` if the HTTP client cannot be
    /// built.
    pub fn new(webhook: impl Into<String>, timeout: Duration) -> Result<Self> {
        let webhook = webhook.into();
        let parsed = url::Url::parse(&webhook)
            .map_err(|e| AlertError::configuration(format!("invalid webhook '{webhook}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AlertError::configuration(format!(
                "webhook '{webhook}' must use http or https"
            )));
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("beacon-alerts/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { webhook, client })
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn webhook(&self) -> &str {
        &self.webhook
    }

    /// Builds the JSON request body for `message` at `timestamp`.
    ///
    /// The signature is only included when `sign_key` is not empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature cannot be computed.
    pub fn request_body(message: &OutboundMessage, sign_key: &str, timestamp: i64) -> Result<Value> {
        let mut body = Map::new();
        body.insert("timestamp".to_string(), Value::String(timestamp.to_string()));
        if !sign_key.is_empty() {
            body.insert("sign".to_string(), Value::String(sign(sign_key, timestamp)?));
        }
        body.insert(
            "msg_type".to_string(),
            Value::String(message.msg_type().to_string()),
        );
        body.insert(message.body_key().to_string(), message.content());
        Ok(Value::Object(body))
    }

    /// Posts `message` and checks the robot's answer.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Delivery` on network or HTTP errors,
    /// `AlertError::Serialization` if the answer is not JSON, and
    /// `AlertError::Rejected` if the robot reports a non-zero status.
    pub fn send(&self, message: &OutboundMessage, sign_key: &str) -> Result<RobotResponse> {
        let body = Self::request_body(message, sign_key, Utc::now().timestamp())?;

        let response = self.client.post(&self.webhook).json(&body).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::delivery(format!(
                "webhook answered HTTP {}",
                status.as_u16()
            )));
        }

        let text = response.text()?;
        let parsed: RobotResponse = serde_json::from_str(&text)?;
        debug!(msg_type = message.msg_type(), "robot accepted message");
        parsed.into_result()
    }
}

impl fmt::Debug for GroupRobot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRobot")
            .field("webhook", &self.webhook)
            .finish_non_exhaustive()
    }
}

/// Delivers to group robots, keeping one client per webhook URL.
pub struct WebhookRobotTransport {
    robots: ResourcePool<String, GroupRobot, AlertError>,
}

impl WebhookRobotTransport {
    /// Creates a transport whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let robots = ResourcePool::new(move |webhook: &String| GroupRobot::new(webhook.clone(), timeout))
            .with_closer(|webhook: &String, _robot: &GroupRobot| {
                debug!(webhook = %webhook, "closing robot client");
                true
            });
        Self { robots }
    }

    /// Returns the pool of robot clients.
    #[must_use]
    pub const fn robots(&self) -> &ResourcePool<String, GroupRobot, AlertError> {
        &self.robots
    }

    /// Releases every robot client; returns how many were closed.
    pub fn close(&self) -> usize {
        let closed = self.robots.close_all();
        info!(closed, "robot clients closed");
        closed
    }
}

impl Default for WebhookRobotTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl fmt::Debug for WebhookRobotTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookRobotTransport")
            .field("robots", &self.robots)
            .finish()
    }
}

impl NotificationTransport for WebhookRobotTransport {
    fn deliver(&self, destination: &ChannelConfig, message: &OutboundMessage) -> Result<()> {
        let robot = self.robots.get(&destination.webhook).map_err(|e| match e {
            PoolError::Creation { source, .. } => source,
            other => AlertError::delivery(other.to_string()),
        })?;
        robot.send(message, &destination.sign_key)?;
        Ok(())
    }
}
