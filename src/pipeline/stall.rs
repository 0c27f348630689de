//! Stall detection for the feed.
//!
//! Materialize emits progress rows continuously while a SUBSCRIBE is healthy,
//! so a long silence means the cursor is wedged. The monitor is polled once
//! per fetch iteration; it never runs on its own timer.

use crate::models::Timestamp;
use std::time::Duration;
use tokio::time::Instant;

/// Tracks when the feed last produced any row.
#[derive(Debug, Clone)]
pub struct StallMonitor {
    timeout: Duration,
    last_timestamp: Option<Timestamp>,
    last_seen_at: Instant,
}

impl StallMonitor {
    /// Start the clock now.
    pub fn new(timeout: Duration) -> Self {
        Self::started_at(timeout, Instant::now())
    }

    pub fn started_at(timeout: Duration, start: Instant) -> Self {
        Self {
            timeout,
            last_timestamp: None,
            last_seen_at: start,
        }
    }

    /// Record a row (marker or data).
    pub fn observe(&mut self, timestamp: Timestamp) {
        self.observe_at(timestamp, Instant::now());
    }

    pub fn observe_at(&mut self, timestamp: Timestamp, at: Instant) {
        self.last_timestamp = Some(timestamp);
        self.last_seen_at = at;
    }

    /// Last feed timestamp seen, if any row arrived yet.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    /// Idle time if it exceeds the timeout.
    pub fn check(&self) -> Option<Duration> {
        self.check_at(Instant::now())
    }

    pub fn check_at(&self, now: Instant) -> Option<Duration> {
        let idle = now.saturating_duration_since(self.last_seen_at);
        (idle > self.timeout).then_some(idle)
    }
}
