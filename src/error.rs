//! # Structured Error Handling
//!
//! Error taxonomy for resource lifecycle and test-unit execution. Start
//! failures are aggregated per batch; stop failures are never surfaced as
//! errors and only appear in logs. A fail-fast skip is a disposition, not a
//! failure, and carries its own variant so reporting can tell them apart.

use thiserror::Error;

/// Errors surfaced by the coordinators.
#[derive(Debug, Error)]
pub enum TestrigError {
    /// A single resource could not be started or its endpoints could not be
    /// read after start.
    #[error("resource '{name}' failed to start")]
    ResourceStart {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// One or more resource starts in a batch failed. Collected after every
    /// dispatched start has finished.
    #[error("{} resource start(s) failed: [{}]", .failures.len(), failed_names(.failures))]
    BatchStart { failures: Vec<TestrigError> },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A test unit failed after exhausting its attempts, or after the
    /// fail-fast signal interrupted its retry loop.
    #[error("test unit '{name}' failed after {attempts} attempt(s)")]
    UnitFailure {
        name: String,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    /// The unit was skipped before running because a prior failure tripped
    /// the fail-fast signal.
    #[error("skipped: {reason}")]
    Skipped { reason: String },
}

impl TestrigError {
    /// Whether this outcome is a fail-fast skip rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, TestrigError::Skipped { .. })
    }
}

fn failed_names(failures: &[TestrigError]) -> String {
    failures
        .iter()
        .map(|failure| match failure {
            TestrigError::ResourceStart { name, .. } => name.as_str(),
            _ => "unknown",
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, TestrigError>;
