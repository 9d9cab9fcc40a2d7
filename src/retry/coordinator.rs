//! # Retry Coordinator
//!
//! Runs a test unit through its setup/body/teardown sequence up to the
//! policy's attempt limit. Every failed attempt gets a best-effort teardown
//! pass so the next attempt starts from a clean slate, and the loop checks
//! the fail-fast signal between attempts so a permanent failure elsewhere
//! in the run cuts the retrying short.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

use crate::error::{Result, TestrigError};
use crate::failfast::{FailFastSignal, RunDecision};
use crate::retry::policy::RetryPolicy;

/// One runnable test unit, registered explicitly by the framework adapter.
///
/// The three phases are independently failable and always invoked in
/// order. Implementations report failures as `anyhow::Error` so arbitrary
/// framework error types pass through unwrapped.
#[async_trait]
pub trait TestUnit: Send {
    /// Stable identity used in attempt logs.
    fn name(&self) -> &str;

    async fn run_setup(&mut self) -> anyhow::Result<()>;

    async fn run_body(&mut self) -> anyhow::Result<()>;

    async fn run_teardown(&mut self) -> anyhow::Result<()>;
}

/// Re-executes failing test units under the configured retry policy.
pub struct RetryCoordinator {
    policy: RetryPolicy,
    fail_fast: Arc<FailFastSignal>,
}

impl RetryCoordinator {
    pub fn new(policy: RetryPolicy, fail_fast: Arc<FailFastSignal>) -> Self {
        Self { policy, fail_fast }
    }

    /// Runs `unit` until it passes, its attempts are exhausted, or the
    /// fail-fast signal trips.
    ///
    /// Success on any attempt returns immediately. Exhaustion records the
    /// fail-fast signal (when enabled) and returns the last failure. A
    /// signal tripped by a concurrently failing unit stops the loop at the
    /// next check and returns the most recent failure, or a skip when no
    /// attempt ever ran.
    pub async fn run_with_retry(&self, unit: &mut dyn TestUnit) -> Result<()> {
        let max_attempts = self.policy.max_attempts();
        let mut last_error: Option<anyhow::Error> = None;
        let mut attempts_made = 0;

        for attempt in 1..=max_attempts {
            if self.fail_fast.has_failed() {
                break;
            }
            attempts_made = attempt;

            match Self::run_once(unit).await {
                Ok(()) => return Ok(()),
                Err(failure) => {
                    error!(
                        cause = %failure.root_cause(),
                        "{} -- Attempt {} of {} <<< FAILURE!",
                        unit.name(),
                        attempt,
                        max_attempts
                    );
                    // Cleanup between attempts is best-effort; its failure
                    // must not mask the attempt's own error.
                    if let Err(cleanup_error) = unit.run_teardown().await {
                        error!(
                            unit = unit.name(),
                            error = %cleanup_error,
                            "error running teardown after failed attempt"
                        );
                    }
                    last_error = Some(failure);
                }
            }

            if attempt < max_attempts && !self.fail_fast.has_failed() {
                tokio::time::sleep(self.policy.delay_before_attempt(attempt)).await;
            }
        }

        match last_error {
            Some(source) => {
                if attempts_made == max_attempts {
                    self.fail_fast.record_failure();
                }
                Err(TestrigError::UnitFailure {
                    name: unit.name().to_string(),
                    attempts: attempts_made,
                    source,
                })
            }
            // The signal was already set before the first attempt.
            None => match self.fail_fast.check() {
                RunDecision::Skip { reason } => Err(TestrigError::Skipped { reason }),
                RunDecision::Proceed => Ok(()),
            },
        }
    }

    async fn run_once(unit: &mut dyn TestUnit) -> anyhow::Result<()> {
        unit.run_setup().await?;
        unit.run_body().await?;
        unit.run_teardown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestrigConfig;
    use crate::failfast::{FailFastSignal, MemoryMarker};
    use anyhow::anyhow;

    struct ScriptedUnit {
        name: String,
        body_failures: u32,
        setups: u32,
        bodies: u32,
        teardowns: u32,
        fail_fast_on_teardown: Option<Arc<FailFastSignal>>,
    }

    impl ScriptedUnit {
        fn failing_first(body_failures: u32) -> Self {
            Self {
                name: "scripted".to_string(),
                body_failures,
                setups: 0,
                bodies: 0,
                teardowns: 0,
                fail_fast_on_teardown: None,
            }
        }
    }

    #[async_trait]
    impl TestUnit for ScriptedUnit {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run_setup(&mut self) -> anyhow::Result<()> {
            self.setups += 1;
            Ok(())
        }

        async fn run_body(&mut self) -> anyhow::Result<()> {
            self.bodies += 1;
            if self.bodies <= self.body_failures {
                Err(anyhow!("flaky failure #{}", self.bodies))
            } else {
                Ok(())
            }
        }

        async fn run_teardown(&mut self) -> anyhow::Result<()> {
            self.teardowns += 1;
            if let Some(signal) = &self.fail_fast_on_teardown {
                signal.record_failure();
            }
            Ok(())
        }
    }

    fn coordinator(max_attempts: u32, enabled: bool) -> (RetryCoordinator, Arc<FailFastSignal>) {
        let config = TestrigConfig {
            max_attempts,
            fixed_delay_ms: 10,
            random_delay_ceiling_ms: 0,
            ..TestrigConfig::default()
        };
        let signal = Arc::new(FailFastSignal::new(Box::new(MemoryMarker::default()), enabled));
        let coordinator = RetryCoordinator::new(RetryPolicy::new(&config), Arc::clone(&signal));
        (coordinator, signal)
    }

    #[tokio::test(start_paused = true)]
    async fn passes_on_first_attempt_without_retrying() {
        let (coordinator, signal) = coordinator(3, true);
        let mut unit = ScriptedUnit::failing_first(0);
        coordinator.run_with_retry(&mut unit).await.unwrap();
        assert_eq!(unit.setups, 1);
        assert_eq!(unit.bodies, 1);
        assert_eq!(unit.teardowns, 1);
        assert!(!signal.has_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_records_the_fail_fast_signal() {
        let (coordinator, signal) = coordinator(3, true);
        let mut unit = ScriptedUnit::failing_first(u32::MAX);
        let error = coordinator.run_with_retry(&mut unit).await.unwrap_err();
        match error {
            TestrigError::UnitFailure { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(unit.bodies, 3);
        assert!(signal.has_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_with_fail_fast_disabled_leaves_the_signal_clear() {
        let (coordinator, signal) = coordinator(2, false);
        let mut unit = ScriptedUnit::failing_first(u32::MAX);
        coordinator.run_with_retry(&mut unit).await.unwrap_err();
        assert!(!signal.has_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn tripped_signal_stops_the_loop_after_the_current_attempt() {
        let (coordinator, signal) = coordinator(3, true);
        let mut unit = ScriptedUnit::failing_first(u32::MAX);
        // Another unit failing permanently is simulated by the teardown
        // tripping the shared signal during attempt one.
        unit.fail_fast_on_teardown = Some(Arc::clone(&signal));
        let error = coordinator.run_with_retry(&mut unit).await.unwrap_err();
        match error {
            TestrigError::UnitFailure { attempts, .. } => assert_eq!(attempts, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(unit.bodies, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pre_set_signal_skips_without_running_anything() {
        let (coordinator, signal) = coordinator(3, true);
        signal.record_failure();
        let mut unit = ScriptedUnit::failing_first(0);
        let error = coordinator.run_with_retry(&mut unit).await.unwrap_err();
        assert!(error.is_skip());
        assert_eq!(unit.setups, 0);
        assert_eq!(unit.bodies, 0);
    }
}
