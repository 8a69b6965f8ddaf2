//! Elapsed and remaining-time estimation.
//!
//! Turns a start time plus a stream of progress snapshots into elapsed and
//! estimated-remaining durations for display. Every method takes `now`
//! explicitly so the estimator is deterministic under test; the controller
//! passes the monotonic clock. Elapsed time derives from that clock, not
//! from snapshot arrival, so the displayed clock never stalls between
//! updates.

use std::time::Duration;

use tokio::time::Instant;

/// Progress-based time estimator.
///
/// Invariants: no estimate at `percent == 0` (no division by zero), the
/// estimated total is never less than elapsed, remaining collapses to zero
/// and freezes at `percent >= 100`, and percent regressions are ignored.
#[derive(Debug, Default)]
pub struct ProgressEstimator {
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    last_percent: f64,
    estimated_total: Option<Duration>,
    complete: bool,
}

impl ProgressEstimator {
    /// Create a fresh estimator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            started_at: None,
            finished_at: None,
            last_percent: 0.0,
            estimated_total: None,
            complete: false,
        }
    }

    /// Apply a progress snapshot.
    ///
    /// The first applied snapshot records the start time. A snapshot whose
    /// percent is lower than the last applied value is ignored for
    /// estimation.
    pub fn apply(&mut self, percent: f64, now: Instant) {
        let percent = percent.clamp(0.0, 100.0);
        let started = *self.started_at.get_or_insert(now);

        if self.complete || percent < self.last_percent {
            return;
        }

        if percent >= 100.0 {
            self.last_percent = 100.0;
            self.complete = true;
            return;
        }

        if percent > self.last_percent && percent > 0.0 {
            let elapsed = now.saturating_duration_since(started);
            let total = elapsed.div_f64(percent / 100.0);
            self.estimated_total = Some(total.max(elapsed));
        }
        self.last_percent = percent;
    }

    /// Stop the clock, pinning elapsed time at `now`.
    pub fn freeze(&mut self, now: Instant) {
        if self.finished_at.is_none() {
            self.finished_at = Some(now);
        }
    }

    /// Last applied percent (monotonically non-decreasing).
    #[must_use]
    pub const fn percent(&self) -> f64 {
        self.last_percent
    }

    /// Elapsed time since the first applied snapshot.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started_at.map_or(Duration::ZERO, |started| {
            self.finished_at
                .unwrap_or(now)
                .saturating_duration_since(started)
        })
    }

    /// Estimated remaining time, if an estimate exists.
    ///
    /// `None` until the first non-zero percent is applied; `Some(ZERO)`
    /// once complete.
    #[must_use]
    pub fn estimated_remaining(&self, now: Instant) -> Option<Duration> {
        if self.complete {
            return Some(Duration::ZERO);
        }
        self.estimated_total
            .map(|total| total.saturating_sub(self.elapsed(now)))
    }

    /// Discard all state, as on a full engine reset.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn no_estimate_before_any_snapshot() {
        let est = ProgressEstimator::new();
        let now = Instant::now();
        assert_eq!(est.elapsed(now), Duration::ZERO);
        assert_eq!(est.estimated_remaining(now), None);
    }

    #[test]
    fn zero_percent_produces_no_estimate() {
        let base = Instant::now();
        let mut est = ProgressEstimator::new();
        est.apply(0.0, base);

        // Clock started, but no division by zero: remaining stays absent.
        assert_eq!(est.estimated_remaining(t(base, 30)), None);
        assert_eq!(est.elapsed(t(base, 30)), Duration::from_secs(30));
    }

    #[test]
    fn estimate_extrapolates_from_progress_rate() {
        let base = Instant::now();
        let mut est = ProgressEstimator::new();
        est.apply(0.0, base);
        est.apply(25.0, t(base, 10));

        // 25% in 10s -> 40s total, 30s remaining.
        assert_eq!(est.estimated_remaining(t(base, 10)), Some(Duration::from_secs(30)));
        // The separate ticking clock keeps draining the estimate.
        assert_eq!(est.estimated_remaining(t(base, 20)), Some(Duration::from_secs(20)));
    }

    #[test]
    fn remaining_saturates_at_zero_when_overdue() {
        let base = Instant::now();
        let mut est = ProgressEstimator::new();
        est.apply(0.0, base);
        est.apply(99.0, t(base, 100));

        // 99% in 100s -> ~101s total; once elapsed passes the estimate the
        // remaining time saturates at zero rather than going negative.
        let remaining = est.estimated_remaining(t(base, 100)).unwrap();
        assert!(remaining > Duration::ZERO && remaining < Duration::from_secs(2));
        assert_eq!(est.estimated_remaining(t(base, 200)), Some(Duration::ZERO));
    }

    #[test]
    fn regression_is_ignored_for_estimation() {
        let base = Instant::now();
        let mut est = ProgressEstimator::new();
        est.apply(40.0, base);
        est.apply(35.0, t(base, 5));

        assert_eq!(est.percent(), 40.0);
        // Elapsed still advances through the regression.
        assert_eq!(est.elapsed(t(base, 5)), Duration::from_secs(5));
    }

    #[test]
    fn remaining_freezes_at_completion() {
        let base = Instant::now();
        let mut est = ProgressEstimator::new();
        est.apply(50.0, base);
        est.apply(100.0, t(base, 8));

        assert_eq!(est.percent(), 100.0);
        assert_eq!(est.estimated_remaining(t(base, 8)), Some(Duration::ZERO));
        assert_eq!(est.estimated_remaining(t(base, 500)), Some(Duration::ZERO));
    }

    #[test]
    fn freeze_pins_elapsed() {
        let base = Instant::now();
        let mut est = ProgressEstimator::new();
        est.apply(10.0, base);
        est.freeze(t(base, 42));

        assert_eq!(est.elapsed(t(base, 42)), Duration::from_secs(42));
        assert_eq!(est.elapsed(t(base, 300)), Duration::from_secs(42));
    }

    #[test]
    fn reset_clears_everything() {
        let base = Instant::now();
        let mut est = ProgressEstimator::new();
        est.apply(60.0, base);
        est.freeze(t(base, 10));
        est.reset();

        assert_eq!(est.percent(), 0.0);
        assert_eq!(est.elapsed(t(base, 20)), Duration::ZERO);
        assert_eq!(est.estimated_remaining(t(base, 20)), None);
    }

    #[test]
    fn out_of_range_percent_is_clamped() {
        let base = Instant::now();
        let mut est = ProgressEstimator::new();
        est.apply(150.0, base);
        assert_eq!(est.percent(), 100.0);
        assert_eq!(est.estimated_remaining(base), Some(Duration::ZERO));
    }
}
