//! # Retry Policy
//!
//! Pure computation of attempt limits and backoff delays. The delay before
//! attempt `n` is `(fixed + uniform[0, ceiling)) * n`: linear backoff
//! scaled by the attempt index, with a randomized component so concurrently
//! retrying units drift apart instead of hammering a struggling resource in
//! lockstep.

use crate::config::TestrigConfig;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    fixed_delay_ms: u64,
    random_delay_ceiling_ms: u64,
}

impl RetryPolicy {
    pub fn new(config: &TestrigConfig) -> Self {
        Self {
            // A unit always gets at least one attempt.
            max_attempts: config.max_attempts.max(1),
            fixed_delay_ms: config.fixed_delay_ms,
            random_delay_ceiling_ms: config.random_delay_ceiling_ms,
        }
    }

    /// Maximum attempts for a unit before it is reported as failed.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the attempt following failed attempt `attempt` (1-based).
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        let jitter_ms = if self.random_delay_ceiling_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.random_delay_ceiling_ms)
        };
        Duration::from_millis((self.fixed_delay_ms + jitter_ms) * u64::from(attempt.max(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&TestrigConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(fixed_ms: u64, ceiling_ms: u64) -> RetryPolicy {
        RetryPolicy::new(&TestrigConfig {
            fixed_delay_ms: fixed_ms,
            random_delay_ceiling_ms: ceiling_ms,
            ..TestrigConfig::default()
        })
    }

    #[test]
    fn default_attempt_limit_is_three() {
        assert_eq!(RetryPolicy::default().max_attempts(), 3);
    }

    #[test]
    fn delay_without_jitter_is_linear_in_the_attempt() {
        let policy = policy(1000, 0);
        assert_eq!(policy.delay_before_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_before_attempt(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_before_attempt(3), Duration::from_millis(3000));
    }

    #[test]
    fn delay_never_drops_below_the_fixed_component() {
        let policy = policy(500, 2000);
        for attempt in 1..=5 {
            for _ in 0..50 {
                let delay = policy.delay_before_attempt(attempt);
                assert!(delay >= Duration::from_millis(500 * u64::from(attempt)));
                assert!(delay < Duration::from_millis((500 + 2000) * u64::from(attempt)));
            }
        }
    }

    #[test]
    fn delay_is_non_decreasing_without_jitter() {
        let policy = policy(250, 0);
        let mut previous = Duration::ZERO;
        for attempt in 1..=10 {
            let delay = policy.delay_before_attempt(attempt);
            assert!(delay >= previous);
            previous = delay;
        }
    }
}
