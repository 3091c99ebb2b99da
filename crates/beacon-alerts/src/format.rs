//! Alert text rendering.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::channel::ChannelConfig;
use crate::dashboard::{discover_url, kuery};
use crate::message::OutboundMessage;
use crate::record::LogRecord;

/// Returns the post title for a record.
#[must_use]
pub fn alert_title(record: &LogRecord) -> String {
    if record.env.is_empty() {
        format!("{} alert", record.level)
    } else {
        format!("[{}] {} alert", record.env, record.level)
    }
}

/// Renders the alert body for `record`.
///
/// When the record has no trace id the trace line shows the origin instead,
/// and the trace link searches by origin. Dashboard links are omitted if the
/// channel has no dashboard URL.
#[must_use]
pub fn format_alert(record: &LogRecord, config: &ChannelConfig, now: DateTime<Utc>) -> String {
    let (trace_shown, trace_query) = if !record.trace.is_empty() {
        (record.trace.as_str(), kuery("trace", &record.trace))
    } else if record.has_url() && record.command.is_empty() {
        (record.url.as_str(), kuery("url", &record.url))
    } else {
        (record.command.as_str(), kuery("command", &record.command))
    };

    let mut text = format!(
        "Environment: {}\nLevel: {}\nTime: {}\nIP: {}\nTrace: {}\nEntry: {}\n\n{}\n",
        record.env,
        record.level,
        record.display_time(),
        record.ip,
        trace_shown,
        record.origin(),
        record.message,
    );

    if !config.dashboard_url.is_empty() {
        let details = discover_url(
            &config.dashboard_url,
            &config.index_name,
            &[kuery("message", &record.message), trace_query.clone()],
            now,
        );
        let chain = discover_url(&config.dashboard_url, &config.index_name, &[trace_query], now);
        let _ = write!(text, "\nDetails\n{details}\nTrace link\n{chain}\n");
    }

    text.push_str("\nPlease look into this as soon as possible.");
    text
}

/// Builds the rich text post delivered for `record`.
#[must_use]
pub fn build_message(record: &LogRecord, config: &ChannelConfig, now: DateTime<Utc>) -> OutboundMessage {
    OutboundMessage::post(
        alert_title(record),
        format_alert(record, config, now),
        &config.user_id,
    )
}
