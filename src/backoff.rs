//! Retry pacing for the lock modification loop.
//!
//! Two tiers exist: a fixed interval when resources are held by another
//! operation (expected contention), and a randomized exponential backoff when
//! a conditional write loses a race or the store fails. Sleeping goes through
//! [`Sleeper`] so tests can run many iterations without real delay.

use crate::config::CooperativeLockingOptions;
use std::time::Duration;

/// Blocks the calling thread.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps with [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Exponential backoff with a bounded interval and no elapsed-time limit.
///
/// Each call to [`next_backoff`](Self::next_backoff) returns the current
/// interval randomized by `± randomization_factor`, then grows the interval
/// by `multiplier` up to the maximum. Intervals have millisecond resolution.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval_ms: u64,
    max_interval_ms: u64,
    multiplier: f64,
    randomization_factor: f64,
    current_interval_ms: u64,
}

impl ExponentialBackoff {
    pub fn new(
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
        randomization_factor: f64,
    ) -> Self {
        let initial_interval_ms = initial_interval.as_millis() as u64;
        Self {
            initial_interval_ms,
            max_interval_ms: max_interval.as_millis() as u64,
            multiplier,
            randomization_factor,
            current_interval_ms: initial_interval_ms,
        }
    }

    /// Backoff configured from locking options.
    pub fn from_options(options: &CooperativeLockingOptions) -> Self {
        Self::new(
            Duration::from_millis(options.min_backoff_interval_ms),
            Duration::from_millis(options.max_backoff_interval_ms),
            options.backoff_multiplier,
            options.backoff_randomization_factor,
        )
    }

    /// Interval the next call will be randomized around.
    pub fn current_interval(&self) -> Duration {
        Duration::from_millis(self.current_interval_ms)
    }

    /// Restart from the initial interval.
    pub fn reset(&mut self) {
        self.current_interval_ms = self.initial_interval_ms;
    }

    /// Duration to sleep before the next attempt.
    pub fn next_backoff(&mut self) -> Duration {
        let delay = randomize(
            self.current_interval_ms,
            self.randomization_factor,
            rand::random::<f64>(),
        );
        let grown = (self.current_interval_ms as f64 * self.multiplier).round() as u64;
        self.current_interval_ms = grown.min(self.max_interval_ms);
        delay
    }
}

/// Pick a point in `interval_ms * (1 ± factor)` using `sample` in `[0, 1)`.
fn randomize(interval_ms: u64, factor: f64, sample: f64) -> Duration {
    let interval = interval_ms as f64;
    let delta = interval * factor;
    let low = interval - delta;
    Duration::from_millis((low + 2.0 * delta * sample).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_interval_grows_by_multiplier_until_cap() {
        let mut backoff = ExponentialBackoff::new(millis(500), millis(2_000), 1.2, 0.0);

        assert_eq!(backoff.next_backoff(), millis(500));
        assert_eq!(backoff.next_backoff(), millis(600));
        assert_eq!(backoff.next_backoff(), millis(720));
        assert_eq!(backoff.current_interval(), millis(864));

        for _ in 0..20 {
            backoff.next_backoff();
        }
        assert_eq!(backoff.current_interval(), millis(2_000));
        assert_eq!(backoff.next_backoff(), millis(2_000));
    }

    #[test]
    fn test_reset_restores_initial_interval() {
        let mut backoff = ExponentialBackoff::new(millis(100), millis(1_000), 2.0, 0.0);
        backoff.next_backoff();
        backoff.next_backoff();
        assert_eq!(backoff.current_interval(), millis(400));

        backoff.reset();
        assert_eq!(backoff.current_interval(), millis(100));
    }

    #[test]
    fn test_randomized_delay_stays_within_bounds() {
        let mut backoff = ExponentialBackoff::new(millis(1_000), millis(1_000), 1.0, 0.5);
        for _ in 0..100 {
            let delay = backoff.next_backoff();
            assert!(delay >= millis(500), "{delay:?}");
            assert!(delay <= millis(1_500), "{delay:?}");
        }
    }

    #[test]
    fn test_randomize_endpoints() {
        assert_eq!(randomize(1_000, 0.5, 0.0), millis(500));
        assert_eq!(randomize(1_000, 0.5, 0.5), millis(1_000));
        assert_eq!(randomize(1_000, 0.0, 0.9), millis(1_000));
    }

    #[test]
    fn test_from_options_uses_configured_bounds() {
        let options = CooperativeLockingOptions {
            min_backoff_interval_ms: 10,
            max_backoff_interval_ms: 40,
            backoff_multiplier: 2.0,
            backoff_randomization_factor: 0.0,
            ..CooperativeLockingOptions::default()
        };
        let mut backoff = ExponentialBackoff::from_options(&options);

        let delays: Vec<_> = (0..4).map(|_| backoff.next_backoff()).collect();
        assert_eq!(delays, vec![millis(10), millis(20), millis(40), millis(40)]);
    }
}
