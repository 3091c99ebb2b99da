//! # beacon-cli
//!
//! Beacon command-line interface.
//!
//! Provides commands for:
//! - Validating an alert configuration and previewing routing
//! - Sending a single alert
//! - Alerting on a stream of JSON log records
//!
//! All commands share one [`app::App`]: the router, its webhook transport and
//! the shutdown hooks that drain the router before the robot pool closes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod cli;
pub mod commands;

pub use app::App;
pub use cli::{CheckArgs, Cli, Commands, SendArgs, WatchArgs};
pub use commands::{CheckCommand, SendCommand, WatchCommand, WatchSummary};
