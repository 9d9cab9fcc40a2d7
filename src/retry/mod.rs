//! # Retry Execution
//!
//! Resilient execution of flaky or environment-dependent test units:
//!
//! - [`policy`] - attempt limits and linear randomized backoff
//! - [`coordinator`] - the bounded retry loop around a test unit, wired to
//!   the cross-run fail-fast signal
//!
//! A unit is retried on the thread of control that runs it; only that unit
//! waits out the backoff. Once any unit in the run fails permanently, the
//! fail-fast signal cuts every other retry loop short.

pub mod coordinator;
pub mod policy;

pub use coordinator::{RetryCoordinator, TestUnit};
pub use policy::RetryPolicy;
