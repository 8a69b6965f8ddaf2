//! Reconnect backoff for the push subscription.
//!
//! Exponential backoff with full jitter: each delay is drawn uniformly
//! between zero and the capped exponential value.

use std::time::Duration;

use rand::Rng;

use crate::config::PushConfig;

/// Bounded reconnect policy for one push subscription.
#[derive(Debug)]
pub struct ReconnectPolicy {
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    max_attempts: u32,
    attempt: u32,
}

impl ReconnectPolicy {
    /// Create a policy from the push channel configuration.
    #[must_use]
    pub const fn new(config: &PushConfig) -> Self {
        Self {
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.backoff_multiplier,
            max_attempts: config.max_reconnect_attempts,
            attempt: 0,
        }
    }

    /// Delay before the next reconnect attempt, or `None` once the attempt
    /// budget is spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }

        let base_ms = self.initial_backoff.as_millis() as f64;
        let exponential = base_ms * self.multiplier.powi(self.attempt.min(i32::MAX as u32) as i32);
        let capped = exponential.min(self.max_backoff.as_millis() as f64);
        let jittered = rand::rng().random_range(0.0..=capped);

        self.attempt += 1;
        Some(Duration::from_millis(jittered as u64))
    }

    /// Reset the attempt counter after a successful subscription.
    pub const fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Attempts consumed since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(initial_ms: u64, max_ms: u64, multiplier: f64, attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy::new(&PushConfig {
            initial_backoff: Duration::from_millis(initial_ms),
            max_backoff: Duration::from_millis(max_ms),
            backoff_multiplier: multiplier,
            max_reconnect_attempts: attempts,
        })
    }

    #[test]
    fn backoff_grows_within_exponential_envelope() {
        let mut p = policy(100, 10_000, 2.0, 5);

        let first = p.next_backoff().unwrap();
        assert!(first <= Duration::from_millis(100));

        let second = p.next_backoff().unwrap();
        assert!(second <= Duration::from_millis(200));

        assert_eq!(p.attempts(), 2);
    }

    #[test]
    fn backoff_caps_at_max() {
        let mut p = policy(1_000, 5_000, 10.0, 10);
        for _ in 0..6 {
            assert!(p.next_backoff().unwrap() <= Duration::from_millis(5_000));
        }
    }

    #[test]
    fn budget_exhausts() {
        let mut p = policy(100, 1_000, 2.0, 3);
        assert!(p.next_backoff().is_some());
        assert!(p.next_backoff().is_some());
        assert!(p.next_backoff().is_some());
        assert!(p.next_backoff().is_none());
    }

    #[test]
    fn reset_restores_budget() {
        let mut p = policy(100, 1_000, 2.0, 2);
        let _ = p.next_backoff();
        let _ = p.next_backoff();
        assert!(p.next_backoff().is_none());

        p.reset();
        assert_eq!(p.attempts(), 0);
        assert!(p.next_backoff().is_some());
    }
}
