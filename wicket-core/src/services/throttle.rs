//! Per-identifier login throttling
//!
//! Every identifier that has failed to log in at least once gets an
//! [`AttemptRecord`]. Failures inside the window pile up; once the count
//! reaches the threshold the identifier is locked out until the window has
//! passed since its last failure. The first failure after the window starts a
//! fresh count.
//!
//! Records are never swept. They live as long as the throttle does, so a
//! process restart clears every lockout.
//!
//! # Example
//!
//! ```rust
//! use wicket_core::services::{AttemptThrottle, ThrottleConfig};
//!
//! let throttle = AttemptThrottle::new(ThrottleConfig::default());
//! assert!(!throttle.is_locked_out("a@x.com"));
//!
//! for _ in 0..5 {
//!     throttle.record_failure("a@x.com");
//! }
//! assert!(throttle.is_locked_out("a@x.com"));
//! ```

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Lockout policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Failures inside the window that lock the identifier out
    pub max_failed_attempts: u32,
    /// How long a lockout lasts after the last failure, and how long failures
    /// keep counting towards one
    pub window: Duration,
    /// Clear the record when a login succeeds
    ///
    /// Off by default: a success on its own does not forgive earlier
    /// failures, the window does.
    pub reset_on_success: bool,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            window: Duration::minutes(30),
            reset_on_success: false,
        }
    }
}

impl ThrottleConfig {
    pub fn with_max_failed_attempts(mut self, max_failed_attempts: u32) -> Self {
        self.max_failed_attempts = max_failed_attempts;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_reset_on_success(mut self, reset_on_success: bool) -> Self {
        self.reset_on_success = reset_on_success;
        self
    }
}

/// Failure history of one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Always at least 1
    pub failure_count: u32,
    pub last_failure_at: DateTime<Utc>,
}

impl AttemptRecord {
    fn first(now: DateTime<Utc>) -> Self {
        Self {
            failure_count: 1,
            last_failure_at: now,
        }
    }

    /// Clock skew counts the same in both directions.
    fn within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        (now - self.last_failure_at).abs() <= window
    }
}

/// Process-wide failure counter keyed by login identifier
///
/// Updates to one identifier are serialised by the map's per-key entry lock;
/// different identifiers only share a lock when they hash to the same shard.
pub struct AttemptThrottle {
    records: DashMap<String, AttemptRecord>,
    config: ThrottleConfig,
}

impl AttemptThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            records: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    pub fn is_locked_out(&self, identifier: &str) -> bool {
        self.is_locked_out_at(identifier, Utc::now())
    }

    /// `false` for an identifier that has never failed.
    pub fn is_locked_out_at(&self, identifier: &str, now: DateTime<Utc>) -> bool {
        self.records
            .get(identifier)
            .is_some_and(|record| self.locks_out(&record, now))
    }

    pub fn record_failure(&self, identifier: &str) -> AttemptRecord {
        self.record_failure_at(identifier, Utc::now())
    }

    /// Count one failure and return the updated record.
    pub fn record_failure_at(&self, identifier: &str, now: DateTime<Utc>) -> AttemptRecord {
        let record = self
            .records
            .entry(identifier.to_string())
            .and_modify(|record| {
                if record.within(self.config.window, now) {
                    record.failure_count = record.failure_count.saturating_add(1);
                    record.last_failure_at = now;
                } else {
                    *record = AttemptRecord::first(now);
                }
            })
            .or_insert_with(|| AttemptRecord::first(now));

        *record
    }

    /// Whether `record` locks its identifier out at `now`.
    pub fn locks_out(&self, record: &AttemptRecord, now: DateTime<Utc>) -> bool {
        record.failure_count >= self.config.max_failed_attempts
            && record.within(self.config.window, now)
    }

    pub fn record(&self, identifier: &str) -> Option<AttemptRecord> {
        self.records.get(identifier).map(|record| *record)
    }

    /// Forget an identifier's failures. Returns whether a record existed.
    pub fn reset(&self, identifier: &str) -> bool {
        self.records.remove(identifier).is_some()
    }
}

impl Default for AttemptThrottle {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}
