//! Fingerprints used as cheap equality keys for alert deduplication.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::record::LogRecord;

/// A fixed-length hash of an alert's deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already computed hash string.
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Returns the hash string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns arbitrary text into a stable [`Fingerprint`].
pub trait Fingerprinter: Send + Sync + fmt::Debug {
    /// Hashes `text`. Equal inputs must produce equal fingerprints.
    fn fingerprint(&self, text: &str) -> Fingerprint;
}

/// Hex-encoded SHA-256 fingerprints (64 characters).
///
/// # Example
///
/// ```rust
/// use beacon_alerts::{Fingerprinter, Sha256Fingerprinter};
///
/// let fp = Sha256Fingerprinter.fingerprint("/api/checkoutdb timeout");
/// assert_eq!(fp.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Fingerprinter;

impl Fingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, text: &str) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Fingerprint(hex::encode(hasher.finalize()))
    }
}

/// Returns the text a record is deduplicated on.
///
/// The first call-stack line wins when the record carries one, so the same
/// failure site collapses regardless of message. Otherwise the origin and
/// message are concatenated.
#[must_use]
pub fn dedup_key(record: &LogRecord) -> String {
    match record.extra.first() {
        Some(line) => line.clone(),
        None => format!("{}{}", record.origin(), record.message),
    }
}
