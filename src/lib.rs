#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Testrig Core
//!
//! Test-execution orchestration for integration suites that share
//! expensive external resources and fight flaky tests.
//!
//! ## Overview
//!
//! Two coordinators cover the two hard problems of a large integration
//! run:
//!
//! - **Resource lifecycle**: database, broker, and cache instances are
//!   started at most once, shared across concurrent test groups through a
//!   reference-counted registry, and stopped only when no group still
//!   needs them. Reusable resources ride out a grace interval after their
//!   last release so back-to-back groups skip the restart.
//! - **Retry and fail-fast**: flaky units are re-run under a linear
//!   randomized backoff, and the first permanent failure trips a durable
//!   signal that skips everything still queued, across processes of the
//!   same build.
//!
//! ## Module Organization
//!
//! - [`resource`] - handles, reference-count registry, lifecycle
//!   coordinator, endpoint property publication, image presets
//! - [`retry`] - retry policy and the bounded retry loop
//! - [`failfast`] - durable fail-fast signal and the pre-unit gate
//! - [`orchestrator`] - process-wide facade wiring it all together
//! - [`config`] - tunables with environment overrides
//! - [`error`] - structured error handling
//! - [`logging`] - structured logging setup
//! - [`helpers`] - polling helpers for eventually-consistent state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use testrig_core::{GroupSettings, ResourceHandle, TestOrchestrator, TestrigConfig};
//!
//! # async fn example(postgres: Arc<dyn testrig_core::TestResource>) -> testrig_core::Result<()> {
//! let orchestrator = TestOrchestrator::new(TestrigConfig::from_env()?);
//! let handles = vec![ResourceHandle::new("POSTGRES", postgres, true)];
//! let settings = GroupSettings::default();
//!
//! orchestrator.ensure_started(&handles, &settings).await?;
//! // run the group's units via orchestrator.run_unit(...)
//! orchestrator.release(&handles, &settings).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod failfast;
pub mod helpers;
pub mod logging;
pub mod orchestrator;
pub mod resource;
pub mod retry;

pub use config::{GroupSettings, TestrigConfig};
pub use error::{Result, TestrigError};
pub use failfast::{FailFastSignal, FileMarker, MarkerStore, MemoryMarker, RunDecision};
pub use orchestrator::TestOrchestrator;
pub use resource::{
    EnvProperties, MemoryProperties, PropertySink, ResourceHandle, ResourceImage,
    ResourceLifecycleCoordinator, ResourceRegistry, TestResource,
};
pub use retry::{RetryCoordinator, RetryPolicy, TestUnit};
