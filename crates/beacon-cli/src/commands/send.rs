//! Send command implementation.

use std::io::Write;

use beacon_alerts::{LogRecord, SendOutcome};
use chrono::Utc;

use crate::app::App;
use crate::cli::SendArgs;

/// Handler for the send command.
pub struct SendCommand<'a> {
    app: &'a App,
}

impl<'a> SendCommand<'a> {
    /// Creates a new send command handler.
    #[must_use]
    pub const fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Sends one alert, waits for it to leave, and prints the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the outcome fails.
    pub fn execute<W: Write>(&self, out: &mut W, args: &SendArgs) -> anyhow::Result<SendOutcome> {
        let outcome = self.app.router().send(&record_from(args));
        // Flushes a background queue before reporting.
        self.app.shutdown();

        writeln!(out, "{outcome}")?;
        Ok(outcome)
    }
}

fn record_from(args: &SendArgs) -> LogRecord {
    let mut record = LogRecord::new(args.level, args.message.as_str())
        .with_url(args.url.as_str())
        .with_command(args.command.as_str())
        .with_trace(args.trace.as_str())
        .with_env(args.env.as_str())
        .with_timestamp(Utc::now());
    for line in &args.extra {
        record = record.with_extra(line.as_str());
    }
    record
}
