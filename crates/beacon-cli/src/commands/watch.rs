//! Watch command implementation.
//!
//! Reads one JSON [`LogRecord`] per line and sends each through the router.
//! Malformed lines are skipped. On Ctrl-C the shutdown hooks drain queued
//! alerts before the process exits.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use beacon_alerts::{AlertRouter, LogRecord, SendOutcome};
use beacon_pool::ShutdownHooks;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::cli::WatchArgs;

/// Exit status used after an interrupt.
const INTERRUPTED: i32 = 130;

/// Counts of what happened to the records read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    /// Records parsed.
    pub records: usize,
    /// Lines that were not valid records.
    pub malformed: usize,
    /// Delivered or queued.
    pub dispatched: usize,
    /// Dropped by the suppression window.
    pub suppressed: usize,
    /// Below the minimum level.
    pub below_threshold: usize,
    /// No channel matched.
    pub unrouted: usize,
    /// Delivery failed.
    pub failed: usize,
}

impl WatchSummary {
    fn count(&mut self, outcome: &SendOutcome) {
        self.records += 1;
        match outcome {
            SendOutcome::Delivered { .. } | SendOutcome::Queued { .. } => self.dispatched += 1,
            SendOutcome::Suppressed => self.suppressed += 1,
            SendOutcome::BelowThreshold => self.below_threshold += 1,
            SendOutcome::NoChannel => self.unrouted += 1,
            SendOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

impl fmt::Display for WatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} record(s): {} dispatched, {} suppressed, {} below threshold, {} unrouted, {} failed",
            self.records,
            self.dispatched,
            self.suppressed,
            self.below_threshold,
            self.unrouted,
            self.failed,
        )?;
        if self.malformed > 0 {
            write!(f, ", {} malformed line(s) skipped", self.malformed)?;
        }
        Ok(())
    }
}

/// Handler for the watch command.
pub struct WatchCommand<'a> {
    app: &'a App,
}

impl<'a> WatchCommand<'a> {
    /// Creates a new watch command handler.
    #[must_use]
    pub const fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Processes the input until it ends, then drains and prints the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened or read, or the signal
    /// handler cannot be installed.
    pub fn execute<W: Write>(&self, out: &mut W, args: &WatchArgs) -> anyhow::Result<WatchSummary> {
        spawn_interrupt_handler(Arc::clone(self.app.hooks()))?;

        let router = self.app.router();
        let summary = match &args.input {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                process_lines(router, BufReader::new(file), out)?
            }
            None => process_lines(router, io::stdin().lock(), out)?,
        };

        let ran = self.app.shutdown();
        debug!(hooks = ran, "shutdown hooks finished");

        writeln!(out, "{summary}")?;
        Ok(summary)
    }
}

/// Sends every record in `input`, writing one outcome line per record.
///
/// # Errors
///
/// Returns an error if reading `input` or writing `out` fails.
pub fn process_lines<R: BufRead, W: Write>(
    router: &AlertRouter,
    input: R,
    out: &mut W,
) -> io::Result<WatchSummary> {
    let mut summary = WatchSummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: LogRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = number, error = %e, "skipping malformed record");
                summary.malformed += 1;
                continue;
            }
        };

        let outcome = router.send(&record);
        debug!(line = number, outcome = %outcome, "record processed");
        writeln!(out, "{number}: {outcome}")?;
        summary.count(&outcome);
    }

    Ok(summary)
}

/// Runs the shutdown hooks and exits when Ctrl-C arrives.
fn spawn_interrupt_handler(hooks: Arc<ShutdownHooks>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start signal runtime")?;

    thread::Builder::new()
        .name("beacon-signal".to_string())
        .spawn(move || {
            if let Err(e) = runtime.block_on(tokio::signal::ctrl_c()) {
                warn!(error = %e, "cannot listen for Ctrl-C");
                return;
            }
            info!("interrupted, draining queued alerts");
            let ran = hooks.run();
            debug!(hooks = ran, "shutdown hooks finished");
            std::process::exit(INTERRUPTED);
        })
        .context("failed to spawn signal thread")?;

    Ok(())
}
