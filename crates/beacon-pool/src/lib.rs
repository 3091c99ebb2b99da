//! Keyed lazy resource pools for Beacon.
//!
//! `beacon-pool` holds the pieces every service connector needs: a pool that
//! creates one shared client per key on first use, a registry of named
//! connection options on top of it, and an ordered list of shutdown hooks.
//!
//! # Features
//!
//! - **At most one creation per key**: concurrent first access to the same key
//!   runs the creator once; every caller gets the same `Arc`
//! - **Failures are not cached**: a failed creation is retried on the next call
//! - **Caller-controlled close**: the closer can stop a bulk close early
//! - **Named connectors**: options validated at registration, `""` means `"default"`
//!
//! # Example
//!
//! ```rust
//! use beacon_pool::{ConnectorOptions, ConnectorRegistry, ShutdownHooks};
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct BrokerOptions {
//!     url: String,
//! }
//!
//! impl ConnectorOptions for BrokerOptions {
//!     fn validate(&self) -> Result<(), String> {
//!         if self.url.is_empty() {
//!             return Err("url is empty".to_string());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! struct Broker {
//!     url: String,
//! }
//!
//! let brokers = Arc::new(
//!     ConnectorRegistry::new(|_name: &str, opts: &BrokerOptions| {
//!         Ok::<_, std::io::Error>(Broker { url: opts.url.clone() })
//!     })
//!     .with_closer(|_name, _broker| true),
//! );
//!
//! brokers
//!     .register("default", BrokerOptions { url: "amqp://localhost".to_string() })
//!     .unwrap();
//! assert_eq!(brokers.get("").unwrap().url, "amqp://localhost");
//!
//! let hooks = ShutdownHooks::new();
//! let closing = Arc::clone(&brokers);
//! hooks.register("brokers", move || {
//!     closing.close_all();
//! });
//! assert_eq!(hooks.run(), 1);
//! ```

#![forbid(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/beacon-pool/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod pool;
pub mod registry;
pub mod shutdown;

// Re-export main types at crate root
pub use error::{PoolError, PoolResult};
pub use pool::ResourcePool;
pub use registry::{ConnectorOptions, ConnectorRegistry, DEFAULT_CONNECTOR};
pub use shutdown::{ShutdownHooks, panic_message};
