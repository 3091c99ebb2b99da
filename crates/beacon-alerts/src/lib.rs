//! Deduplicating log alerts for Beacon.
//!
//! `beacon-alerts` routes log records to chat group robots. Each record is
//! matched to a channel by its origin (command line or request URL) and
//! level, checked against a short history of recent alerts, and delivered as
//! a rich-text post with links into the log dashboard.
//!
//! # Features
//!
//! - **Channel routing**: channel names match as substrings of the record origin,
//!   with optional level filters and per-kind default channels
//! - **Suppression**: identical alerts within 10 minutes are dropped
//! - **Never fails the caller**: delivery errors and panics are reported to stderr
//! - **Background dispatch**: optionally deliver from a worker thread
//! - **Tracing bridge**: [`AlertLayer`] turns `tracing` warnings and errors into alerts
//!
//! # Example
//!
//! ```rust,no_run
//! use beacon_alerts::{AlertRouter, AlertsConfig, LogLevel, LogRecord, WebhookRobotTransport};
//! use std::sync::Arc;
//!
//! let config = AlertsConfig::from_toml(r#"
//!     [channels.default_api]
//!     webhook = "https://open.example.com/hook/abc"
//!     sign_key = "secret"
//! "#).unwrap();
//!
//! let transport = Arc::new(WebhookRobotTransport::default());
//! let router = AlertRouter::from_config(&config, transport).unwrap();
//!
//! let record = LogRecord::new(LogLevel::Error, "db timeout").with_url("/api/checkout");
//! println!("{}", router.send(&record));
//! ```

#![forbid(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/beacon-alerts/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod channel;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod layer;
pub mod message;
pub mod record;
pub mod router;
pub mod sign;
pub mod suppression;
pub mod transport;

// Re-export main types at crate root
pub use channel::{Channel, ChannelConfig};
pub use config::{AlertsConfig, Dispatch};
pub use error::{AlertError, Result};
pub use fingerprint::{Fingerprint, Fingerprinter, Sha256Fingerprinter};
pub use layer::AlertLayer;
pub use message::OutboundMessage;
pub use record::{LogLevel, LogRecord};
pub use router::{AlertRouter, SendOutcome};
pub use suppression::SuppressionWindow;
pub use transport::{GroupRobot, NotificationTransport, WebhookRobotTransport};
