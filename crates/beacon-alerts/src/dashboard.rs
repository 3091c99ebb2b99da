//! Deep links into the log dashboard's discover view.
//!
//! Links carry their state in rison-encoded `_a` (app: index and query) and
//! `_g` (global: time range) fragments.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use url::form_urlencoded;

/// Longest value, in characters, kept in a single query term.
pub const MAX_QUERY_VALUE_CHARS: usize = 90;

/// Renders a `field:"value"` query term.
///
/// Double quotes are stripped from the value. Values longer than
/// [`MAX_QUERY_VALUE_CHARS`] are cut to that length and then back to the last
/// space, backslash or `::` so that a term never ends mid-token.
///
/// # Example
///
/// ```rust
/// use beacon_alerts::dashboard::kuery;
///
/// assert_eq!(kuery("trace", "a1\"b2"), "trace:\"a1b2\"");
/// ```
#[must_use]
pub fn kuery(field: &str, value: &str) -> String {
    let mut value: String = value.chars().filter(|c| *c != '"').collect();

    if value.chars().count() > MAX_QUERY_VALUE_CHARS {
        value = value.chars().take(MAX_QUERY_VALUE_CHARS).collect();
        let cut = [value.rfind(' '), value.rfind('\\'), value.rfind("::")]
            .into_iter()
            .flatten()
            .max();
        if let Some(cut) = cut {
            value.truncate(cut);
        }
    }

    format!("{field}:\"{value}\"")
}

/// Builds a discover-view URL searching `index` for all `queries`, over the
/// day before and after `now`.
#[must_use]
pub fn discover_url(base: &str, index: &str, queries: &[String], now: DateTime<Utc>) -> String {
    let from = (now - Duration::days(1)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let to = (now + Duration::days(1)).to_rfc3339_opts(SecondsFormat::Secs, true);

    format!(
        "{base}#/?_a=(index:'{}',query:(language:'kuery',query:'{}'))&_g=(time:(from:'{}',to:'{}'))",
        rison_value(index),
        rison_value(&queries.join(" AND ")),
        rison_value(&from),
        rison_value(&to),
    )
}

/// Escapes a rison string value for use inside a URL.
fn rison_value(value: &str) -> String {
    let escaped = value.replace('\'', "!'");
    form_urlencoded::byte_serialize(escaped.as_bytes()).collect()
}
