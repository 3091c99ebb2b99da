//! Tracing layer that turns warnings and errors into alerts.
//!
//! [`AlertLayer`] plugs the router into `tracing-subscriber`, so that
//! `tracing::error!` anywhere in the process can page a chat group. Events
//! emitted by the alert path itself (this crate, the robot pool and the HTTP
//! stack beneath it) are ignored so a failing webhook cannot feed back into
//! the router.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

use crate::record::{LogLevel, LogRecord};
use crate::router::AlertRouter;

/// Target prefixes that never produce alerts.
///
/// `hyper` also covers `hyper_util`, the connection layer under reqwest.
const IGNORED_TARGETS: [&str; 5] = ["beacon_alerts", "beacon_pool", "reqwest", "hyper", "h2"];

/// A tracing layer feeding WARN and ERROR events to an [`AlertRouter`].
///
/// The event fields `command`, `url`, `trace` and `ip` are copied onto the
/// record when present. Without a `command` field the event target is used
/// as the command, so channels can match on module paths.
pub struct AlertLayer {
    router: Arc<AlertRouter>,
    env: String,
    ip: String,
}

impl AlertLayer {
    /// Creates a layer delivering through `router`.
    #[must_use]
    pub fn new(router: Arc<AlertRouter>) -> Self {
        Self {
            router,
            env: String::new(),
            ip: String::new(),
        }
    }

    /// Sets the environment name stamped on every record.
    #[must_use]
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    /// Sets the host address stamped on records that carry no `ip` field.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    fn is_ignored(target: &str) -> bool {
        IGNORED_TARGETS.iter().any(|prefix| target.starts_with(prefix))
    }
}

impl fmt::Debug for AlertLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertLayer")
            .field("env", &self.env)
            .field("ip", &self.ip)
            .finish_non_exhaustive()
    }
}

/// Visitor that pulls the alert-relevant fields out of an event.
#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    command: Option<String>,
    url: Option<String>,
    trace: Option<String>,
    ip: Option<String>,
}

impl RecordVisitor {
    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "message" => Some(&mut self.message),
            "command" => Some(&mut self.command),
            "url" => Some(&mut self.url),
            "trace" => Some(&mut self.trace),
            "ip" => Some(&mut self.ip),
            _ => None,
        }
    }
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if let Some(slot) = self.slot(field.name()) {
            *slot = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if let Some(slot) = self.slot(field.name()) {
            *slot = Some(value.to_string());
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = match *metadata.level() {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warning,
            _ => return,
        };
        if Self::is_ignored(metadata.target()) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(level, visitor.message.unwrap_or_default())
            .with_command(visitor.command.unwrap_or_else(|| metadata.target().to_string()))
            .with_url(visitor.url.unwrap_or_default())
            .with_trace(visitor.trace.unwrap_or_default())
            .with_ip(visitor.ip.unwrap_or_else(|| self.ip.clone()))
            .with_env(self.env.clone())
            .with_timestamp(Utc::now());
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            record = record.with_extra(format!("{file}:{line}"));
        }

        self.router.send(&record);
    }
}
