//! Backoff policy for the [`watcher`](crate::watcher)'s reconnect loop.
use std::time::Duration;

use rand::Rng;

/// How many reconnect attempts a watch task is allowed before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Never reconnect; the first termination is final.
    Never,
    /// Reconnect up to `n` times since the last successfully delivered event.
    MaxAttempts(u32),
    /// Reconnect indefinitely.
    Forever,
}

/// The delay curve applied between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffKind {
    /// A constant delay.
    Fixed(Duration),
    /// `min(max_delay, initial_delay * multiplier^(attempt - 1))`.
    Exponential {
        /// Growth factor applied per attempt.
        multiplier: f64,
        /// Ceiling on the computed delay.
        max_delay: Duration,
    },
}

/// `{policy, backoff, initialDelay, jitter}` from the watch engine's reconnect contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryStrategy {
    /// Attempt budget.
    pub policy: RetryPolicy,
    /// Delay curve.
    pub backoff: BackoffKind,
    /// Delay before the first reconnect attempt (also the exponential base).
    pub initial_delay: Duration,
    /// Fraction (0.0-1.0) of the computed delay added as uniform random noise.
    pub jitter: f64,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::MaxAttempts(10),
            backoff: BackoffKind::Fixed(Duration::from_secs(5)),
            initial_delay: Duration::from_secs(1),
            jitter: 0.2,
        }
    }
}

impl RetryStrategy {
    /// The delay before reconnect attempt `attempt` (1-indexed), jitter applied.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = match self.backoff {
            BackoffKind::Fixed(d) => d,
            BackoffKind::Exponential { multiplier, max_delay } => {
                let scaled = self.initial_delay.as_secs_f64() * multiplier.powi(attempt as i32 - 1);
                Duration::from_secs_f64(scaled.min(max_delay.as_secs_f64()))
            }
        };
        jittered(base, self.jitter)
    }
}

fn jittered(delay: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 {
        return delay;
    }
    let spread = delay.as_secs_f64() * jitter;
    let noise = rand::rng().random_range(-spread..=spread);
    Duration::from_secs_f64((delay.as_secs_f64() + noise).max(0.0))
}

/// Counts reconnect attempts against a [`RetryStrategy`] and yields the
/// delay for each one, matching the `Backoff: Iterator<Item = Duration> +
/// reset()` shape the reference workspace uses for its stream backoffs —
/// here driven directly by the watch task's reconnect loop instead of
/// wrapping a `Stream`.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    strategy: RetryStrategy,
    attempt: u32,
}

impl RetryBackoff {
    /// Start counting attempts against `strategy`, beginning at zero.
    pub fn new(strategy: RetryStrategy) -> Self {
        Self { strategy, attempt: 0 }
    }

    /// Consume one unit of retry budget and return the delay before the
    /// next attempt, or `None` if the policy has been exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let allowed = match self.strategy.policy {
            RetryPolicy::Never => false,
            RetryPolicy::MaxAttempts(n) => self.attempt < n,
            RetryPolicy::Forever => true,
        };
        if !allowed {
            return None;
        }
        self.attempt += 1;
        Some(self.strategy.delay_for_attempt(self.attempt))
    }

    /// Reset the attempt counter to zero, e.g. after a successfully
    /// delivered event.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// The number of reconnect attempts made since the last [`reset`](Self::reset).
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn strategy(backoff: BackoffKind) -> RetryStrategy {
        RetryStrategy {
            policy: RetryPolicy::Forever,
            backoff,
            initial_delay: Duration::from_secs(1),
            jitter: 0.0,
        }
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let mut b = RetryBackoff::new(strategy(BackoffKind::Fixed(Duration::from_secs(5))));
        assert_eq!(b.next_delay(), Some(Duration::from_secs(5)));
        assert_eq!(b.next_delay(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn exponential_backoff_never_exceeds_max_and_is_nondecreasing() {
        let mut b = RetryBackoff::new(strategy(BackoffKind::Exponential {
            multiplier: 2.0,
            max_delay: Duration::from_secs(20),
        }));
        let mut last = Duration::ZERO;
        let mut delays = Vec::new();
        for _ in 0..8 {
            let d = b.next_delay().unwrap();
            assert!(d <= Duration::from_secs(20));
            delays.push(d);
        }
        for d in delays {
            assert!(d >= last);
            last = d;
        }
    }

    #[test]
    fn max_attempts_exhausts_budget() {
        let mut b = RetryBackoff::new(RetryStrategy {
            policy: RetryPolicy::MaxAttempts(2),
            ..strategy(BackoffKind::Fixed(Duration::from_secs(1)))
        });
        assert!(b.next_delay().is_some());
        assert!(b.next_delay().is_some());
        assert!(b.next_delay().is_none());
    }

    #[test]
    fn never_policy_has_no_budget() {
        let mut b = RetryBackoff::new(RetryStrategy {
            policy: RetryPolicy::Never,
            ..strategy(BackoffKind::Fixed(Duration::from_secs(1)))
        });
        assert!(b.next_delay().is_none());
    }

    #[test]
    fn reset_zeroes_attempt_count() {
        let mut b = RetryBackoff::new(RetryStrategy {
            policy: RetryPolicy::MaxAttempts(1),
            ..strategy(BackoffKind::Fixed(Duration::from_secs(1)))
        });
        assert!(b.next_delay().is_some());
        assert!(b.next_delay().is_none());
        b.reset();
        assert_eq!(b.attempts(), 0);
        assert!(b.next_delay().is_some());
    }
}
