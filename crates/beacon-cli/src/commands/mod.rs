//! CLI command implementations.
//!
//! - [`check`] - Configuration validation and routing preview
//! - [`send`] - One-off alert delivery
//! - [`watch`] - Alerting on a stream of JSON log records

pub mod check;
pub mod send;
pub mod watch;

pub use check::CheckCommand;
pub use send::SendCommand;
pub use watch::{WatchCommand, WatchSummary};
