//! Backoff policy: decides the delay before a retry attempt.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with jitter, capped.
///
/// Contract:
/// - `delay(0)` is zero: a task's first attempt runs immediately.
/// - For `attempt >= 1`: `min(2^attempt + uniform(0, 1), cap)` seconds.
///
/// The jitter intentionally breaks determinism so that many tasks failing
/// together do not retry in lockstep. Tests assert the bounded range, not
/// exact values.
///
/// Stateless; safe to call from any number of tasks concurrently.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Upper bound on the computed delay (jitter included).
    pub cap: Duration,
}

impl BackoffPolicy {
    pub const DEFAULT_CAP: Duration = Duration::from_secs(60);

    pub fn new(cap: Duration) -> Self {
        Self { cap }
    }

    /// Delay before the attempt following `attempt_count` failures.
    pub fn delay(&self, attempt_count: u32) -> Duration {
        if attempt_count == 0 {
            return Duration::ZERO;
        }

        // 2^attempt saturates well past the cap for large counts.
        let base = 2f64.powi(attempt_count.min(30) as i32);
        let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
        let delay = Duration::from_secs_f64(base + jitter);

        delay.min(self.cap)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAP)
    }
}
