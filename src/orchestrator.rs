//! # Test Orchestrator
//!
//! Facade owning the coordinators and the shared state they consult:
//! registry, lifecycle coordinator, retry coordinator, fail-fast signal,
//! and the property surface. Constructed once per process and injected
//! wherever a framework adapter needs it; independent instances (with
//! in-memory stores) keep harness tests isolated from each other.
//!
//! The four framework callback points map onto this type directly:
//!
//! | callback              | entry point         |
//! |-----------------------|---------------------|
//! | before-group start    | [`TestOrchestrator::ensure_started`] |
//! | after-group finish    | [`TestOrchestrator::release`]        |
//! | before each unit      | [`TestOrchestrator::check_unit`]     |
//! | unit execution        | [`TestOrchestrator::run_unit`]       |

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::{GroupSettings, TestrigConfig};
use crate::error::{Result, TestrigError};
use crate::failfast::{FailFastSignal, MarkerStore, RunDecision};
use crate::resource::coordinator::ResourceLifecycleCoordinator;
use crate::resource::handle::ResourceHandle;
use crate::resource::properties::{EnvProperties, PropertySink};
use crate::resource::registry::ResourceRegistry;
use crate::retry::coordinator::{RetryCoordinator, TestUnit};
use crate::retry::policy::RetryPolicy;

/// Process-wide coordination facade for a test run.
pub struct TestOrchestrator {
    id: Uuid,
    config: TestrigConfig,
    registry: Arc<ResourceRegistry>,
    lifecycle: ResourceLifecycleCoordinator,
    retry: RetryCoordinator,
    fail_fast: Arc<FailFastSignal>,
}

impl TestOrchestrator {
    /// Orchestrator with the production surfaces: endpoint properties in
    /// the process environment and a file-backed fail-fast marker.
    pub fn new(config: TestrigConfig) -> Self {
        Self::with_components(
            config.clone(),
            Arc::new(EnvProperties),
            Box::new(crate::failfast::FileMarker::new(
                config.fail_fast_marker.clone(),
            )),
        )
    }

    /// Orchestrator over explicit property and marker stores.
    pub fn with_components(
        config: TestrigConfig,
        properties: Arc<dyn PropertySink>,
        marker: Box<dyn MarkerStore>,
    ) -> Self {
        let id = Uuid::new_v4();
        let registry = Arc::new(ResourceRegistry::new());
        let lifecycle =
            ResourceLifecycleCoordinator::new(Arc::clone(&registry), properties, &config);
        let fail_fast = Arc::new(FailFastSignal::new(marker, config.fail_fast_enabled));
        let retry = RetryCoordinator::new(RetryPolicy::new(&config), Arc::clone(&fail_fast));

        info!(
            orchestrator_id = %id,
            max_attempts = config.max_attempts,
            fail_fast_enabled = config.fail_fast_enabled,
            parallel_start = config.parallel_start,
            "test orchestrator initialized"
        );

        Self {
            id,
            config,
            registry,
            lifecycle,
            retry,
            fail_fast,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &TestrigConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    pub fn fail_fast(&self) -> &FailFastSignal {
        &self.fail_fast
    }

    /// Before-group hook: brings every handle's resource up.
    pub async fn ensure_started(
        &self,
        handles: &[ResourceHandle],
        settings: &GroupSettings,
    ) -> Result<()> {
        self.lifecycle.ensure_started(handles, settings).await
    }

    /// After-group hook: releases every handle, stopping or deferring per
    /// reuse policy.
    pub async fn release(&self, handles: &[ResourceHandle], settings: &GroupSettings) {
        self.lifecycle.release(handles, settings).await;
    }

    /// Before-each-unit hook: skip decision once the run has failed.
    pub fn check_unit(&self) -> RunDecision {
        self.fail_fast.check()
    }

    /// Runs a unit under retry, short-circuiting when the run has already
    /// failed. A skip is reported as [`TestrigError::Skipped`], never as a
    /// unit failure.
    pub async fn run_unit(&self, unit: &mut dyn TestUnit) -> Result<()> {
        if let RunDecision::Skip { reason } = self.check_unit() {
            info!(unit = unit.name(), reason = %reason, "skipping test unit");
            return Err(TestrigError::Skipped { reason });
        }
        self.retry.run_with_retry(unit).await
    }
}
