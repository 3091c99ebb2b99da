//! Check command implementation.

use std::io::Write;

use beacon_alerts::{AlertsConfig, Dispatch, LogRecord};

use crate::app::App;
use crate::cli::CheckArgs;

/// Handler for the check command.
pub struct CheckCommand<'a> {
    app: &'a App,
}

impl<'a> CheckCommand<'a> {
    /// Creates a new check command handler.
    #[must_use]
    pub const fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Prints the channel table and, if asked, the routing preview.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn execute<W: Write>(&self, out: &mut W, args: &CheckArgs) -> anyhow::Result<()> {
        let config = self.app.config();
        let router = self.app.router();
        let names = router.channel_names();

        writeln!(
            out,
            "config ok: {} channel(s), min level {}, {} dispatch",
            names.len(),
            config.min_level,
            dispatch_name(config),
        )?;
        writeln!(out, "{:<24} {:<20} WEBHOOK", "CHANNEL", "LEVELS")?;
        for name in &names {
            let Some(channel) = router.channel(name) else {
                continue;
            };
            let levels = if channel.levels.is_empty() {
                "*".to_string()
            } else {
                channel.levels.join(",")
            };
            let signed = if channel.sign_key.is_empty() { "" } else { " (signed)" };
            writeln!(out, "{name:<24} {levels:<20} {}{signed}", channel.webhook)?;
        }

        for (fallback, label) in [
            (&config.default_command_channel, "command"),
            (&config.default_api_channel, "api"),
        ] {
            if router.channel(fallback).is_none() {
                writeln!(out, "note: default {label} channel '{fallback}' is not registered")?;
            }
        }

        let preview = match (&args.command, &args.url) {
            (Some(command), _) => Some(LogRecord::new(args.level, "").with_command(command.as_str())),
            (None, Some(url)) => Some(LogRecord::new(args.level, "").with_url(url.as_str())),
            (None, None) => None,
        };
        if let Some(record) = preview {
            if record.level < router.min_level() {
                writeln!(out, "route: {} is below the minimum level", record.level)?;
            } else {
                match router.route(&record) {
                    Some(channel) => writeln!(out, "route: {} -> {channel}", record.origin())?,
                    None => writeln!(out, "route: {} -> no channel", record.origin())?,
                }
            }
        }
        Ok(())
    }
}

const fn dispatch_name(config: &AlertsConfig) -> &'static str {
    match config.dispatch {
        Dispatch::Inline => "inline",
        Dispatch::Background => "background",
    }
}
