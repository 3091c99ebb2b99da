//! Command-line argument parsing with clap.

use std::path::PathBuf;

use beacon_alerts::LogLevel;
use clap::{Args, Parser, Subcommand};

/// Beacon - deduplicating log alerts for chat group robots.
#[derive(Parser, Debug, Clone)]
#[command(name = "beacon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Alert configuration file (TOML).
    #[arg(short, long, env = "BEACON_CONFIG", default_value = "beacon.toml")]
    pub config: PathBuf,

    /// Also alert on this process's own warnings and errors.
    #[arg(long)]
    pub alert_tracing: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Validate the configuration and show the channels in matching order.
    Check(CheckArgs),

    /// Send a single alert.
    Send(SendArgs),

    /// Read JSON log records line by line and alert on them.
    ///
    /// Stops at end of input or on Ctrl-C; queued alerts are drained first.
    Watch(WatchArgs),
}

/// Arguments for the check command.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Show where a record from this command line would be routed.
    #[arg(long = "entry", conflicts_with = "url")]
    pub command: Option<String>,

    /// Show where a record from this request URL would be routed.
    #[arg(long)]
    pub url: Option<String>,

    /// Level used for the routing preview.
    #[arg(short, long, value_parser = parse_level, default_value = "error")]
    pub level: LogLevel,
}

/// Arguments for the send command.
#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Alert message.
    #[arg(short, long)]
    pub message: String,

    /// Severity.
    #[arg(short, long, value_parser = parse_level, default_value = "error")]
    pub level: LogLevel,

    /// Request URL the event came from.
    #[arg(long, default_value = "")]
    pub url: String,

    /// Command line the event came from.
    #[arg(long = "entry", default_value = "")]
    pub command: String,

    /// Trace id.
    #[arg(long, default_value = "")]
    pub trace: String,

    /// Environment name.
    #[arg(long, default_value = "")]
    pub env: String,

    /// Call-stack line; repeat for more.
    #[arg(long = "stack")]
    pub extra: Vec<String>,
}

/// Arguments for the watch command.
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Read from this file instead of standard input.
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Parses a level name for clap.
///
/// # Errors
///
/// Returns the parse error text for unknown names.
pub fn parse_level(value: &str) -> Result<LogLevel, String> {
    value.parse::<LogLevel>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send() {
        let cli = Cli::parse_from([
            "beacon",
            "send",
            "--message",
            "db timeout",
            "--level",
            "critical",
            "--url",
            "/api/checkout",
            "--stack",
            "src/db.rs:1",
            "--stack",
            "src/main.rs:2",
        ]);
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.message, "db timeout");
                assert_eq!(args.level, LogLevel::Critical);
                assert_eq!(args.url, "/api/checkout");
                assert_eq!(args.extra.len(), 2);
            }
            other => unreachable!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn config_flag() {
        let cli = Cli::parse_from(["beacon", "-c", "/etc/beacon.toml", "check"]);
        assert_eq!(cli.config, PathBuf::from("/etc/beacon.toml"));
        assert!(!cli.alert_tracing);
    }

    #[test]
    fn rejects_unknown_level() {
        let result = Cli::try_parse_from(["beacon", "send", "-m", "x", "-l", "loud"]);
        assert!(result.is_err());
    }

    #[test]
    fn check_preview_is_one_origin() {
        let result =
            Cli::try_parse_from(["beacon", "check", "--entry", "bin/sync", "--url", "/api"]);
        assert!(result.is_err());

        let cli = Cli::parse_from(["beacon", "check", "--url", "/api/orders", "-l", "warning"]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.url.as_deref(), Some("/api/orders"));
                assert_eq!(args.level, LogLevel::Warning);
            }
            other => unreachable!("expected check, got {other:?}"),
        }
    }

    #[test]
    fn watch_defaults_to_stdin() {
        let cli = Cli::parse_from(["beacon", "--alert-tracing", "watch"]);
        assert!(cli.alert_tracing);
        match cli.command {
            Commands::Watch(args) => assert!(args.input.is_none()),
            other => unreachable!("expected watch, got {other:?}"),
        }
    }
}
