//! Alert router.
//!
//! The [`AlertRouter`] takes log records and runs each through a fixed
//! pipeline:
//!
//! 1. drop records below the minimum level
//! 2. pick the first channel whose name occurs in the record's origin and
//!    whose level filter accepts the record, else the default channel
//! 3. fingerprint the record and consult the shared [`SuppressionWindow`]
//! 4. format the alert and hand it to the [`NotificationTransport`]
//!
//! The router never fails its caller. Formatting or delivery errors, panics
//! included, are written to standard error and summarized in the returned
//! [`SendOutcome`].

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use beacon_pool::panic_message;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelConfig};
use crate::config::{AlertsConfig, DEFAULT_API_CHANNEL, DEFAULT_COMMAND_CHANNEL, Dispatch};
use crate::error::Result;
use crate::fingerprint::{Fingerprinter, Sha256Fingerprinter, dedup_key};
use crate::format::build_message;
use crate::message::OutboundMessage;
use crate::record::{LogLevel, LogRecord};
use crate::suppression::SuppressionWindow;
use crate::transport::NotificationTransport;

/// Alerts that may wait for the background worker by default.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// What happened to a record passed to [`AlertRouter::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The record's level is below the router's minimum.
    BelowThreshold,
    /// No channel matched and the default channel is not registered.
    NoChannel,
    /// An identical alert was delivered recently.
    Suppressed,
    /// Delivered on the calling thread.
    Delivered {
        /// Channel the alert went to.
        channel: String,
    },
    /// Handed to the background worker.
    Queued {
        /// Channel the alert is going to.
        channel: String,
    },
    /// Formatting or delivery failed; the failure was reported to stderr.
    Failed {
        /// Channel the alert was meant for.
        channel: String,
        /// What went wrong.
        reason: String,
    },
}

impl SendOutcome {
    /// Returns true if the alert was delivered or queued for delivery.
    #[must_use]
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Delivered { .. } | Self::Queued { .. })
    }

    /// Returns the selected channel, if the record got that far.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        match self {
            Self::Delivered { channel } | Self::Queued { channel } | Self::Failed { channel, .. } => {
                Some(channel.as_str())
            }
            _ => None,
        }
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowThreshold => write!(f, "below threshold"),
            Self::NoChannel => write!(f, "no channel"),
            Self::Suppressed => write!(f, "suppressed"),
            Self::Delivered { channel } => write!(f, "delivered to {channel}"),
            Self::Queued { channel } => write!(f, "queued for {channel}"),
            Self::Failed { channel, reason } => write!(f, "failed for {channel}: {reason}"),
        }
    }
}

struct Job {
    channel: String,
    config: ChannelConfig,
    message: OutboundMessage,
}

enum WorkerState {
    Idle,
    Running {
        sender: SyncSender<Job>,
        handle: JoinHandle<()>,
    },
    Closed,
}

/// Routes log records to channels, suppressing recent duplicates.
///
/// # Example
///
/// ```rust
/// use beacon_alerts::{AlertRouter, ChannelConfig, LogLevel, LogRecord, SendOutcome};
/// use beacon_alerts::transport::NotificationTransport;
/// use beacon_alerts::message::OutboundMessage;
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct Discard;
///
/// impl NotificationTransport for Discard {
///     fn deliver(&self, _: &ChannelConfig, _: &OutboundMessage) -> beacon_alerts::Result<()> {
///         Ok(())
///     }
/// }
///
/// let router = AlertRouter::new(Arc::new(Discard));
/// router
///     .register_channel("default_api", ChannelConfig::new("https://hook.example.com/api"))
///     .unwrap();
///
/// let record = LogRecord::new(LogLevel::Error, "db timeout").with_url("/api/checkout");
/// assert!(router.send(&record).is_dispatched());
/// assert_eq!(router.send(&record), SendOutcome::Suppressed);
/// ```
pub struct AlertRouter {
    channels: RwLock<Vec<Channel>>,
    suppression: SuppressionWindow,
    fingerprinter: Box<dyn Fingerprinter>,
    transport: Arc<dyn NotificationTransport>,
    min_level: LogLevel,
    default_command_channel: String,
    default_api_channel: String,
    dispatch: Dispatch,
    queue_capacity: usize,
    worker: Mutex<WorkerState>,
}

impl AlertRouter {
    /// Creates a router with no channels that delivers through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn NotificationTransport>) -> Self {
        Self {
            channels: RwLock::new(Vec::new()),
            suppression: SuppressionWindow::new(),
            fingerprinter: Box::new(Sha256Fingerprinter),
            transport,
            min_level: LogLevel::Notice,
            default_command_channel: DEFAULT_COMMAND_CHANNEL.to_string(),
            default_api_channel: DEFAULT_API_CHANNEL.to_string(),
            dispatch: Dispatch::Inline,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker: Mutex::new(WorkerState::Idle),
        }
    }

    /// Creates a router from configuration, registering every channel.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Configuration` if any channel is invalid.
    pub fn from_config(config: &AlertsConfig, transport: Arc<dyn NotificationTransport>) -> Result<Self> {
        let router = Self::new(transport)
            .with_min_level(config.min_level)
            .with_default_channels(&config.default_command_channel, &config.default_api_channel)
            .with_dispatch(config.dispatch);
        router.register_channels(config.channels.clone())?;
        Ok(router)
    }

    /// Sets the minimum level that is alerted on.
    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Sets the fallback channel names for command and request records.
    #[must_use]
    pub fn with_default_channels(mut self, command: &str, api: &str) -> Self {
        command.clone_into(&mut self.default_command_channel);
        api.clone_into(&mut self.default_api_channel);
        self
    }

    /// Sets where delivery runs.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Sets how many alerts may wait for the background worker.
    ///
    /// Background sends beyond this report [`SendOutcome::Failed`].
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Replaces the fingerprint function.
    #[must_use]
    pub fn with_fingerprinter(mut self, fingerprinter: impl Fingerprinter + 'static) -> Self {
        self.fingerprinter = Box::new(fingerprinter);
        self
    }

    /// Replaces the suppression window.
    #[must_use]
    pub fn with_suppression(mut self, window: SuppressionWindow) -> Self {
        self.suppression = window;
        self
    }

    /// Registers a channel. Re-registering a name replaces it in place,
    /// keeping its matching position.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Configuration` if the channel has no webhook or
    /// lists an unknown level; nothing is registered in that case.
    pub fn register_channel(&self, name: impl Into<String>, mut config: ChannelConfig) -> Result<()> {
        let name = name.into();
        config.normalize();
        config.validate(&name)?;

        let mut channels = self.channels.write();
        if let Some(existing) = channels.iter_mut().find(|c| c.name == name) {
            existing.config = config;
            info!(channel = %name, "replaced alert channel");
        } else {
            info!(channel = %name, levels = ?config.levels, "registered alert channel");
            channels.push(Channel { name, config });
        }
        Ok(())
    }

    /// Registers channels in name order, stopping at the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn register_channels(&self, channels: BTreeMap<String, ChannelConfig>) -> Result<()> {
        for (name, config) in channels {
            self.register_channel(name, config)?;
        }
        Ok(())
    }

    /// Returns the configuration of a registered channel.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<ChannelConfig> {
        self.channels
            .read()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.config.clone())
    }

    /// Returns channel names in matching order.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.read().iter().map(|c| c.name.clone()).collect()
    }

    /// Returns the shared suppression window.
    #[must_use]
    pub const fn suppression(&self) -> &SuppressionWindow {
        &self.suppression
    }

    /// Returns the minimum level that is alerted on.
    #[must_use]
    pub const fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Returns the dispatch mode.
    #[must_use]
    pub const fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    /// Returns the name of the channel `record` would be routed to, if any.
    ///
    /// Does not apply the level gate or touch the suppression window.
    #[must_use]
    pub fn route(&self, record: &LogRecord) -> Option<String> {
        self.select(record).map(|c| c.name)
    }

    fn select(&self, record: &LogRecord) -> Option<Channel> {
        let channels = self.channels.read();
        let origin = record.origin();

        if let Some(found) = channels.iter().find(|c| c.matches(origin, record.level)) {
            return Some(found.clone());
        }

        let fallback = if record.has_url() {
            &self.default_api_channel
        } else {
            &self.default_command_channel
        };
        channels.iter().find(|c| &c.name == fallback).cloned()
    }

    /// Runs `record` through the alert pipeline.
    pub fn send(&self, record: &LogRecord) -> SendOutcome {
        if record.level < self.min_level {
            return SendOutcome::BelowThreshold;
        }

        let Some(channel) = self.select(record) else {
            debug!(origin = %record.origin(), "no alert channel for record");
            return SendOutcome::NoChannel;
        };

        let key = dedup_key(record);
        if !key.is_empty() {
            let fingerprint = self.fingerprinter.fingerprint(&key);
            if self.suppression.should_suppress(&fingerprint, record.timestamp) {
                return SendOutcome::Suppressed;
            }
        }

        let built = panic::catch_unwind(AssertUnwindSafe(|| {
            build_message(record, &channel.config, Utc::now())
        }));
        let message = match built {
            Ok(message) => message,
            Err(payload) => {
                let reason = format!("formatting panicked: {}", panic_message(&*payload));
                report_failure(&channel.name, &reason);
                return SendOutcome::Failed {
                    channel: channel.name,
                    reason,
                };
            }
        };

        match self.dispatch {
            Dispatch::Inline => deliver(self.transport.as_ref(), &channel.name, &channel.config, &message),
            Dispatch::Background => self.enqueue(Job {
                channel: channel.name,
                config: channel.config,
                message,
            }),
        }
    }

    fn enqueue(&self, job: Job) -> SendOutcome {
        let mut state = self.worker.lock();

        if matches!(*state, WorkerState::Idle) {
            match spawn_worker(Arc::clone(&self.transport), self.queue_capacity) {
                Ok((sender, handle)) => *state = WorkerState::Running { sender, handle },
                Err(e) => {
                    drop(state);
                    warn!(error = %e, "cannot start alert worker, delivering inline");
                    return deliver(self.transport.as_ref(), &job.channel, &job.config, &job.message);
                }
            }
        }

        let (channel, reason) = match &*state {
            WorkerState::Running { sender, .. } => {
                let channel = job.channel.clone();
                match sender.try_send(job) {
                    Ok(()) => return SendOutcome::Queued { channel },
                    Err(TrySendError::Full(_)) => (channel, "alert queue is full"),
                    Err(TrySendError::Disconnected(_)) => (channel, "alert worker has stopped"),
                }
            }
            _ => (job.channel, "router is closed"),
        };
        // Report only after unlocking: subscribers may send through this router.
        drop(state);

        let reason = reason.to_string();
        report_failure(&channel, &reason);
        SendOutcome::Failed { channel, reason }
    }

    /// Stops background delivery after draining queued alerts.
    ///
    /// Later background sends report [`SendOutcome::Failed`]. Inline
    /// delivery is unaffected. Calling `close` again is a no-op.
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.worker.lock(), WorkerState::Closed);
        if let WorkerState::Running { sender, handle } = previous {
            drop(sender);
            if handle.join().is_err() {
                warn!("alert worker exited abnormally");
            }
            info!("alert worker drained");
        }
    }
}

impl Drop for AlertRouter {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for AlertRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertRouter")
            .field("channels", &self.channel_names())
            .field("min_level", &self.min_level)
            .field("dispatch", &self.dispatch)
            .field("suppression", &self.suppression)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

fn spawn_worker(
    transport: Arc<dyn NotificationTransport>,
    capacity: usize,
) -> std::io::Result<(SyncSender<Job>, JoinHandle<()>)> {
    let (sender, receiver) = mpsc::sync_channel::<Job>(capacity);
    let handle = thread::Builder::new()
        .name("beacon-alerts".to_string())
        .spawn(move || {
            for job in receiver {
                deliver(transport.as_ref(), &job.channel, &job.config, &job.message);
            }
            debug!("alert worker stopped");
        })?;
    Ok((sender, handle))
}

fn deliver(
    transport: &dyn NotificationTransport,
    channel: &str,
    config: &ChannelConfig,
    message: &OutboundMessage,
) -> SendOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| transport.deliver(config, message)));
    let reason = match result {
        Ok(Ok(())) => {
            debug!(channel = %channel, "alert delivered");
            return SendOutcome::Delivered {
                channel: channel.to_string(),
            };
        }
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("delivery panicked: {}", panic_message(&*payload)),
    };

    report_failure(channel, &reason);
    SendOutcome::Failed {
        channel: channel.to_string(),
        reason,
    }
}

/// Alerting cannot alert on its own failures; stderr is the last resort.
fn report_failure(channel: &str, reason: &str) {
    eprintln!("beacon-alerts: alert for channel '{channel}' failed: {reason}");
    warn!(channel = %channel, reason = %reason, "alert delivery failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertError;
    use chrono::{DateTime, Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, OutboundMessage)>>,
    }

    impl RecordingTransport {
        fn count(&self) -> usize {
            self.sent.lock().len()
        }

        fn webhooks(&self) -> Vec<String> {
            self.sent.lock().iter().map(|(w, _)| w.clone()).collect()
        }
    }

    impl NotificationTransport for RecordingTransport {
        fn deliver(&self, destination: &ChannelConfig, message: &OutboundMessage) -> Result<()> {
            self.sent
                .lock()
                .push((destination.webhook.clone(), message.clone()));
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct FailingTransport {
        attempts: AtomicUsize,
    }

    impl NotificationTransport for FailingTransport {
        fn deliver(&self, _: &ChannelConfig, _: &OutboundMessage) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(AlertError::delivery("connection refused"))
        }
    }

    #[derive(Debug)]
    struct PanickingTransport;

    impl NotificationTransport for PanickingTransport {
        #[allow(clippy::panic)]
        fn deliver(&self, _: &ChannelConfig, _: &OutboundMessage) -> Result<()> {
            panic!("transport exploded");
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn hook(name: &str) -> String {
        format!("https://hook.example.com/{name}")
    }

    fn router_with(transport: Arc<dyn NotificationTransport>) -> AlertRouter {
        let router = AlertRouter::new(transport);
        router
            .register_channel("orders", ChannelConfig::new(hook("orders")).with_levels(["error"]))
            .unwrap();
        router
            .register_channel("default_api", ChannelConfig::new(hook("default_api")))
            .unwrap();
        router
            .register_channel("default_command", ChannelConfig::new(hook("default_command")))
            .unwrap();
        router
    }

    fn api_error(url: &str, message: &str) -> LogRecord {
        LogRecord::new(LogLevel::Error, message)
            .with_url(url)
            .with_timestamp(t0())
    }

    mod registration_tests {
        use super::*;

        #[test]
        fn empty_webhook_is_configuration_error() {
            let router = AlertRouter::new(Arc::new(RecordingTransport::default()));
            let err = router
                .register_channel("orders", ChannelConfig::default())
                .unwrap_err();
            assert!(matches!(err, AlertError::Configuration { .. }));
            assert!(router.channel_names().is_empty());
        }

        #[test]
        fn reregister_replaces_in_place() {
            let router = router_with(Arc::new(RecordingTransport::default()));
            router
                .register_channel("orders", ChannelConfig::new(hook("orders-v2")))
                .unwrap();

            assert_eq!(router.channel_names(), vec!["orders", "default_api", "default_command"]);
            assert_eq!(router.channel("orders").unwrap().webhook, hook("orders-v2"));
        }

        #[test]
        fn from_config_registers_channels() {
            let config = AlertsConfig::from_toml(
                r#"
min_level = "error"
default_api_channel = "fallback"

[channels.fallback]
webhook = "https://hook.example.com/fallback"

[channels.orders]
levels = ["critical"]
webhook = "https://hook.example.com/orders"
"#,
            )
            .unwrap();
            let transport = Arc::new(RecordingTransport::default());
            let router = AlertRouter::from_config(&config, transport.clone()).unwrap();

            assert_eq!(router.min_level(), LogLevel::Error);
            assert_eq!(router.channel_names(), vec!["fallback", "orders"]);
            assert_eq!(router.channel("orders").unwrap().levels, vec!["CRITICAL"]);

            let outcome = router.send(&api_error("/api/orders/1", "boom"));
            assert_eq!(
                outcome,
                SendOutcome::Delivered {
                    channel: "fallback".to_string()
                }
            );
        }
    }

    mod routing_tests {
        use super::*;

        #[test]
        fn below_threshold_is_dropped_before_routing() {
            let transport = Arc::new(RecordingTransport::default());
            let router = router_with(transport.clone());

            let record = LogRecord::new(LogLevel::Info, "cache warm").with_url("/api/orders/1");
            assert_eq!(router.send(&record), SendOutcome::BelowThreshold);
            assert!(router.suppression().is_empty());
            assert_eq!(transport.count(), 0);
        }

        #[test]
        fn notice_is_the_default_threshold() {
            let router = router_with(Arc::new(RecordingTransport::default()));
            let record = LogRecord::new(LogLevel::Notice, "n").with_url("/api/x");
            assert!(router.send(&record).is_dispatched());
        }

        #[test]
        fn channel_selection_precedence() {
            let transport = Arc::new(RecordingTransport::default());
            let router = router_with(transport.clone()).with_min_level(LogLevel::Debug);

            let error = api_error("/api/orders/123", "a");
            assert_eq!(router.route(&error).as_deref(), Some("orders"));

            let info = LogRecord::new(LogLevel::Info, "b").with_url("/api/orders/123");
            assert_eq!(router.route(&info).as_deref(), Some("default_api"));

            router.send(&error);
            router.send(&info);
            assert_eq!(transport.webhooks(), vec![hook("orders"), hook("default_api")]);
        }

        #[test]
        fn command_records_fall_back_to_default_command() {
            let router = router_with(Arc::new(RecordingTransport::default()));
            let record = LogRecord::new(LogLevel::Error, "x").with_command("bin/sync --all");
            assert_eq!(
                router.send(&record),
                SendOutcome::Delivered {
                    channel: "default_command".to_string()
                }
            );
        }

        #[test]
        fn command_records_match_by_substring() {
            let router = router_with(Arc::new(RecordingTransport::default()));
            let record = LogRecord::new(LogLevel::Error, "x").with_command("php artisan orders:sync");
            assert_eq!(router.route(&record).as_deref(), Some("orders"));
        }

        #[test]
        fn missing_default_is_no_channel() {
            let transport = Arc::new(RecordingTransport::default());
            let router = AlertRouter::new(transport.clone());
            router
                .register_channel("orders", ChannelConfig::new(hook("orders")))
                .unwrap();

            let record = api_error("/api/checkout", "db timeout");
            assert_eq!(router.send(&record), SendOutcome::NoChannel);
            assert!(router.suppression().is_empty());
            assert_eq!(transport.count(), 0);
        }

        #[test]
        fn custom_default_names() {
            let router = AlertRouter::new(Arc::new(RecordingTransport::default()))
                .with_default_channels("ops", "web");
            router.register_channel("web", ChannelConfig::new(hook("web"))).unwrap();
            router.register_channel("ops", ChannelConfig::new(hook("ops"))).unwrap();

            assert_eq!(router.route(&api_error("/x", "y")).as_deref(), Some("web"));
            let cmd = LogRecord::new(LogLevel::Error, "y").with_command("cron");
            assert_eq!(router.route(&cmd).as_deref(), Some("ops"));
        }
    }

    mod suppression_tests {
        use super::*;

        #[test]
        fn duplicate_within_a_second_is_suppressed() {
            let transport = Arc::new(RecordingTransport::default());
            let router = router_with(transport.clone());

            let first = api_error("/api/checkout", "db timeout");
            let second = first.clone().with_timestamp(t0() + Duration::seconds(1));

            assert!(router.send(&first).is_dispatched());
            assert_eq!(router.send(&second), SendOutcome::Suppressed);
            assert_eq!(transport.count(), 1);
            assert_eq!(router.suppression().len(), 1);
        }

        #[test]
        fn redelivered_after_window() {
            let transport = Arc::new(RecordingTransport::default());
            let router = router_with(transport.clone());
            let record = api_error("/api/checkout", "db timeout");

            assert!(router.send(&record).is_dispatched());
            assert_eq!(
                router.send(&record.clone().with_timestamp(t0() + Duration::minutes(5))),
                SendOutcome::Suppressed
            );
            assert!(
                router
                    .send(&record.clone().with_timestamp(t0() + Duration::minutes(11)))
                    .is_dispatched()
            );
            assert_eq!(transport.count(), 2);
        }

        #[test]
        fn stack_line_collapses_different_messages() {
            let transport = Arc::new(RecordingTransport::default());
            let router = router_with(transport.clone());

            let a = api_error("/api/checkout", "timeout after 3s").with_extra("src/db.rs:88");
            let b = api_error("/api/cart", "timeout after 5s").with_extra("src/db.rs:88");

            assert!(router.send(&a).is_dispatched());
            assert_eq!(router.send(&b), SendOutcome::Suppressed);
            assert_eq!(transport.count(), 1);
        }

        #[test]
        fn window_is_shared_across_channels() {
            let transport = Arc::new(RecordingTransport::default());
            let router = router_with(transport.clone());

            let api = api_error("/api/x", "boom").with_extra("src/lib.rs:1");
            let cmd = LogRecord::new(LogLevel::Error, "other")
                .with_command("bin/job")
                .with_timestamp(t0())
                .with_extra("src/lib.rs:1");

            assert!(router.send(&api).is_dispatched());
            assert_eq!(router.send(&cmd), SendOutcome::Suppressed);
        }

        #[test]
        fn empty_key_skips_suppression() {
            let transport = Arc::new(RecordingTransport::default());
            let router = router_with(transport.clone());
            let record = LogRecord::new(LogLevel::Error, "").with_timestamp(t0());

            assert!(router.send(&record).is_dispatched());
            assert!(router.send(&record).is_dispatched());
            assert!(router.suppression().is_empty());
        }
    }

    mod failure_tests {
        use super::*;

        #[test]
        fn transport_error_is_swallowed() {
            let transport = Arc::new(FailingTransport::default());
            let router = router_with(transport.clone());

            let outcome = router.send(&api_error("/api/checkout", "db timeout"));
            assert_eq!(
                outcome,
                SendOutcome::Failed {
                    channel: "default_api".to_string(),
                    reason: "delivery failed: connection refused".to_string(),
                }
            );
            assert_eq!(transport.attempts.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn failed_delivery_still_counts_for_suppression() {
            let transport = Arc::new(FailingTransport::default());
            let router = router_with(transport.clone());
            let record = api_error("/api/checkout", "db timeout");

            router.send(&record);
            assert_eq!(router.send(&record), SendOutcome::Suppressed);
            assert_eq!(transport.attempts.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn transport_panic_is_swallowed() {
            let router = router_with(Arc::new(PanickingTransport));

            let outcome = router.send(&api_error("/api/checkout", "db timeout"));
            match outcome {
                SendOutcome::Failed { channel, reason } => {
                    assert_eq!(channel, "default_api");
                    assert!(reason.contains("transport exploded"));
                }
                other => unreachable!("unexpected outcome {other:?}"),
            }
        }
    }

    mod dispatch_tests {
        use super::*;

        #[test]
        fn background_delivers_after_close() {
            let transport = Arc::new(RecordingTransport::default());
            let router = router_with(transport.clone()).with_dispatch(Dispatch::Background);

            for n in 0..5 {
                let outcome = router.send(&api_error("/api/orders/1", &format!("failure {n}")));
                assert_eq!(
                    outcome,
                    SendOutcome::Queued {
                        channel: "orders".to_string()
                    }
                );
            }

            router.close();
            assert_eq!(transport.count(), 5);
        }

        /// Blocks every delivery until the test releases it.
        #[derive(Debug)]
        struct GatedTransport {
            started: Mutex<mpsc::Sender<()>>,
            release: Mutex<mpsc::Receiver<()>>,
        }

        impl NotificationTransport for GatedTransport {
            fn deliver(&self, _: &ChannelConfig, _: &OutboundMessage) -> Result<()> {
                let _ = self.started.lock().send(());
                let _ = self.release.lock().recv();
                Ok(())
            }
        }

        #[test]
        fn full_queue_fails_instead_of_growing() {
            let (started_tx, started_rx) = mpsc::channel();
            let (release_tx, release_rx) = mpsc::channel();
            let transport = Arc::new(GatedTransport {
                started: Mutex::new(started_tx),
                release: Mutex::new(release_rx),
            });
            let router = router_with(transport)
                .with_dispatch(Dispatch::Background)
                .with_queue_capacity(1);

            // The worker takes the first alert and blocks in the transport.
            assert!(router.send(&api_error("/api/orders/1", "first")).is_dispatched());
            started_rx.recv().unwrap();

            // The second waits in the queue; the third finds it full.
            assert!(router.send(&api_error("/api/orders/1", "second")).is_dispatched());
            let outcome = router.send(&api_error("/api/orders/1", "third"));
            assert!(matches!(
                outcome,
                SendOutcome::Failed { ref reason, .. } if reason == "alert queue is full"
            ));

            for _ in 0..2 {
                release_tx.send(()).unwrap();
            }
            router.close();
        }

        #[test]
        fn send_after_close_fails() {
            let transport = Arc::new(RecordingTransport::default());
            let router = router_with(transport.clone()).with_dispatch(Dispatch::Background);
            router.close();

            let outcome = router.send(&api_error("/api/x", "y"));
            assert!(matches!(outcome, SendOutcome::Failed { ref reason, .. } if reason == "router is closed"));
            assert_eq!(transport.count(), 0);
        }

        #[test]
        fn background_survives_panicking_transport() {
            let router = router_with(Arc::new(PanickingTransport)).with_dispatch(Dispatch::Background);
            assert!(router.send(&api_error("/api/a", "1")).is_dispatched());
            assert!(router.send(&api_error("/api/b", "2")).is_dispatched());
            router.close();
        }

        #[test]
        fn close_is_idempotent() {
            let router = router_with(Arc::new(RecordingTransport::default()))
                .with_dispatch(Dispatch::Background);
            router.send(&api_error("/api/a", "1"));
            router.close();
            router.close();
        }

        #[test]
        fn outcome_display() {
            assert_eq!(SendOutcome::Suppressed.to_string(), "suppressed");
            assert_eq!(
                SendOutcome::Queued {
                    channel: "orders".to_string()
                }
                .to_string(),
                "queued for orders"
            );
            assert_eq!(SendOutcome::NoChannel.channel(), None);
        }
    }
}
