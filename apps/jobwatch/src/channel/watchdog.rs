//! Stall watchdog.
//!
//! Tracks the last time any channel produced an update. When both channels
//! stay silent past the threshold the view flags a non-fatal "still trying"
//! indicator; it is cleared by the next update, never escalated to an
//! error.

use std::time::Duration;

use tokio::time::Instant;

/// Watches for prolonged silence across both channels.
#[derive(Debug)]
pub struct UpdateWatchdog {
    threshold: Duration,
    last_activity: Instant,
}

impl UpdateWatchdog {
    /// Create a watchdog armed at `now`.
    #[must_use]
    pub const fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            threshold,
            last_activity: now,
        }
    }

    /// Record channel activity.
    pub const fn record(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Whether silence has lasted at least the threshold.
    #[must_use]
    pub fn is_stalled(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_activity) >= self.threshold
    }

    /// Re-arm from `now`, as on a session reset.
    pub const fn reset(&mut self, now: Instant) {
        self.last_activity = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_watchdog_is_not_stalled() {
        let now = Instant::now();
        let dog = UpdateWatchdog::new(Duration::from_secs(10), now);
        assert!(!dog.is_stalled(now + Duration::from_secs(9)));
    }

    #[test]
    fn silence_past_threshold_stalls() {
        let now = Instant::now();
        let dog = UpdateWatchdog::new(Duration::from_secs(10), now);
        assert!(dog.is_stalled(now + Duration::from_secs(10)));
    }

    #[test]
    fn activity_clears_the_stall() {
        let now = Instant::now();
        let mut dog = UpdateWatchdog::new(Duration::from_secs(10), now);
        assert!(dog.is_stalled(now + Duration::from_secs(30)));

        dog.record(now + Duration::from_secs(30));
        assert!(!dog.is_stalled(now + Duration::from_secs(35)));
    }
}
