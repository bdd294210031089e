//! Poll Statistics Module
//!
//! Tracks how poll cycles turned out: successes, failures, and rejected overlaps.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Poll Stats ==
/// Counters for poll cycles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStats {
    /// Number of polls attempted
    pub polls: u64,
    /// Polls that produced a snapshot
    pub successes: u64,
    /// Polls that ended in an error
    pub failures: u64,
    /// Polls refused because another one was in flight
    pub busy_rejections: u64,
    /// Completed snapshots discarded because a newer one was already published
    pub stale_discards: u64,
    /// Time of the last successful poll
    pub last_success_at: Option<DateTime<Utc>>,
}

impl PollStats {
    // == Constructor ==
    /// Creates a new PollStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Success Rate ==
    /// Returns successes / polls, or 0.0 if nothing has been polled yet.
    pub fn success_rate(&self) -> f64 {
        if self.polls == 0 {
            0.0
        } else {
            self.successes as f64 / self.polls as f64
        }
    }

    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.polls += 1;
        self.successes += 1;
        self.last_success_at = Some(at);
    }

    pub fn record_failure(&mut self) {
        self.polls += 1;
        self.failures += 1;
    }

    pub fn record_busy(&mut self) {
        self.busy_rejections += 1;
    }

    pub fn record_stale(&mut self) {
        self.stale_discards += 1;
    }
}
