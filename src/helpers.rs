//! # Test Helpers
//!
//! Polling utilities for suites waiting on eventually-consistent state
//! (a resource accepting connections, a queue draining, a row appearing).

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Very short wait time.
pub const VERY_SHORT_WAIT: Duration = Duration::from_millis(100);

/// Short wait time.
pub const SHORT_WAIT: Duration = Duration::from_millis(500);

/// Regular wait time.
pub const REGULAR_WAIT: Duration = Duration::from_millis(2500);

/// Long wait time.
pub const LONG_WAIT: Duration = Duration::from_millis(11_000);

/// Very long wait time.
pub const VERY_LONG_WAIT: Duration = Duration::from_millis(29_000);

/// Polls `supplier` every `poll` until `predicate` accepts its value or
/// `max_wait` elapses. Returns whether a valid state was met in time.
pub async fn wait_until_valid<T, S, Fut, P>(
    mut supplier: S,
    predicate: P,
    max_wait: Duration,
    poll: Duration,
) -> bool
where
    S: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let deadline = Instant::now() + max_wait;
    while Instant::now() < deadline {
        if predicate(&supplier().await) {
            return true;
        }
        sleep(poll).await;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_true_once_the_predicate_holds() {
        let polls = AtomicU32::new(0);
        let polls_ref = &polls;
        let met = wait_until_valid(
            move || async move { polls_ref.fetch_add(1, Ordering::SeqCst) + 1 },
            |count| *count >= 3,
            Duration::from_secs(5),
            Duration::from_millis(100),
        )
        .await;
        assert!(met);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_false_when_the_window_closes_first() {
        let met = wait_until_valid(
            || async { false },
            |value| *value,
            Duration::from_millis(300),
            Duration::from_millis(100),
        )
        .await;
        assert!(!met);
    }
}
