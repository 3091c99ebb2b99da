//! Bounded, time-aware duplicate filter for alerts.
//!
//! [`SuppressionWindow`] remembers the most recent fingerprints that were let
//! through. It is a recency filter, not a set: once `capacity` other distinct
//! fingerprints have passed, an old fingerprint is forgotten even if its
//! window has not expired yet.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::fingerprint::Fingerprint;

/// Number of fingerprints remembered by default.
pub const DEFAULT_CAPACITY: usize = 10;

/// Default suppression window in minutes.
pub const DEFAULT_WINDOW_MINUTES: i64 = 10;

/// A fixed-capacity history of recently delivered fingerprints.
#[derive(Debug)]
pub struct SuppressionWindow {
    history: Mutex<VecDeque<(Fingerprint, DateTime<Utc>)>>,
    capacity: usize,
    window: Duration,
}

impl SuppressionWindow {
    /// Creates a window remembering 10 fingerprints for 10 minutes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, Duration::minutes(DEFAULT_WINDOW_MINUTES))
    }

    /// Creates a window with custom limits. A zero capacity is raised to one.
    #[must_use]
    pub fn with_limits(capacity: usize, window: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
            window,
        }
    }

    /// Decides whether an event with `fingerprint` at `now` is a duplicate.
    ///
    /// Returns true, leaving the history untouched, if the same fingerprint
    /// was recorded less than one window before `now`. Otherwise records the
    /// fingerprint, evicts the oldest entry when over capacity, and returns
    /// false.
    pub fn should_suppress(&self, fingerprint: &Fingerprint, now: DateTime<Utc>) -> bool {
        let mut history = self.history.lock();

        let duplicate = history
            .iter()
            .any(|(seen, at)| seen == fingerprint && *at + self.window > now);
        if duplicate {
            debug!(fingerprint = %fingerprint, "suppressing duplicate alert");
            return true;
        }

        history.push_back((fingerprint.clone(), now));
        while history.len() > self.capacity {
            history.pop_front();
        }
        false
    }

    /// Returns the number of remembered fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    /// Returns true if nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the configured window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Forgets every remembered fingerprint.
    pub fn clear(&self) {
        self.history.lock().clear();
    }

    /// Returns true if `fingerprint` is currently remembered, regardless of age.
    #[must_use]
    pub fn remembers(&self, fingerprint: &Fingerprint) -> bool {
        self.history.lock().iter().any(|(seen, _)| seen == fingerprint)
    }
}

impl Default for SuppressionWindow {
    fn default() -> Self {
        Self::new()
    }
}
