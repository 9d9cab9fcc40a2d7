//! # Resource Lifecycle Coordinator
//!
//! Orchestrates the start of a group's resources before it runs and their
//! conditional stop after it finishes. Start of a batch is a fan-out/fan-in
//! join: individual failures are logged, siblings keep going, and the
//! aggregate error is assembled only after every dispatched start has
//! finished. Stop is best-effort and never surfaces an error.
//!
//! Per resource the observable lifecycle is
//! `NotStarted -> Starting -> Running -> (StopScheduled) -> Stopped`.
//! `StopScheduled` exists only for reusable resources whose count dropped
//! to zero; an acquire landing within the grace interval silently returns
//! the resource to `Running` because the deferred check finds the count
//! raised and does nothing.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{GroupSettings, TestrigConfig};
use crate::error::{Result, TestrigError};
use crate::resource::handle::ResourceHandle;
use crate::resource::properties::PropertySink;
use crate::resource::registry::ResourceRegistry;

/// Coordinates reference-counted start/stop of shared resources.
pub struct ResourceLifecycleCoordinator {
    registry: Arc<ResourceRegistry>,
    properties: Arc<dyn PropertySink>,
    stop_grace: Duration,
}

impl ResourceLifecycleCoordinator {
    pub fn new(
        registry: Arc<ResourceRegistry>,
        properties: Arc<dyn PropertySink>,
        config: &TestrigConfig,
    ) -> Self {
        Self {
            registry,
            properties,
            stop_grace: Duration::from_millis(config.stop_grace_ms),
        }
    }

    /// Ensures every handle's resource is running before the group starts.
    ///
    /// Blocks until all dispatched starts complete. Returns an aggregate
    /// error when at least one start failed; sibling starts are never
    /// aborted by a failure in the same batch.
    pub async fn ensure_started(
        &self,
        handles: &[ResourceHandle],
        settings: &GroupSettings,
    ) -> Result<()> {
        let mut failures = Vec::new();

        if settings.parallel_start {
            let jobs: Vec<_> = handles
                .iter()
                .map(|handle| {
                    let handle = handle.clone();
                    let registry = Arc::clone(&self.registry);
                    let properties = Arc::clone(&self.properties);
                    let settings = *settings;
                    tokio::spawn(async move {
                        Self::start_one(&registry, properties.as_ref(), &handle, &settings).await
                    })
                })
                .collect();
            for (handle, joined) in handles.iter().zip(futures::future::join_all(jobs).await) {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(failure)) => failures.push(failure),
                    Err(join_error) => failures.push(TestrigError::ResourceStart {
                        name: handle.name().to_string(),
                        source: anyhow::Error::new(join_error),
                    }),
                }
            }
        } else {
            for handle in handles {
                if let Err(failure) =
                    Self::start_one(&self.registry, self.properties.as_ref(), handle, settings)
                        .await
                {
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TestrigError::BatchStart { failures })
        }
    }

    /// Releases every handle after the group finishes.
    ///
    /// Non-reusable resources stop synchronously within this call. Reusable
    /// ones get a deferred re-check after the grace interval; the detached
    /// check stops the resource only if no acquire landed in the meantime,
    /// and its outcome never reaches this caller.
    pub async fn release(&self, handles: &[ResourceHandle], settings: &GroupSettings) {
        if settings.parallel_start {
            let jobs: Vec<_> = handles
                .iter()
                .map(|handle| {
                    let handle = handle.clone();
                    let registry = Arc::clone(&self.registry);
                    let settings = *settings;
                    let grace = self.stop_grace;
                    tokio::spawn(async move {
                        Self::release_one(registry, &handle, &settings, grace).await;
                    })
                })
                .collect();
            futures::future::join_all(jobs).await;
        } else {
            for handle in handles {
                Self::release_one(Arc::clone(&self.registry), handle, settings, self.stop_grace)
                    .await;
            }
        }
    }

    async fn start_one(
        registry: &ResourceRegistry,
        properties: &dyn PropertySink,
        handle: &ResourceHandle,
        settings: &GroupSettings,
    ) -> Result<()> {
        let count = registry.acquire(handle);
        let reuse = handle.reuse() && settings.reuse_resources;
        let running = handle.resource().is_running().await;

        if count == 1 || !running || !reuse {
            info!(resource = handle.name(), count, reuse, "starting resource");
            if let Err(source) = handle.resource().start().await {
                error!(resource = handle.name(), error = %source, "error starting resource");
                return Err(TestrigError::ResourceStart {
                    name: handle.name().to_string(),
                    source,
                });
            }
            Self::publish_endpoints(properties, handle).await?;
        } else {
            debug!(resource = handle.name(), count, "resource already running");
        }
        Ok(())
    }

    /// Publishes `<NAME>_<port>` and `<NAME>_HOST` for a started resource.
    async fn publish_endpoints(
        properties: &dyn PropertySink,
        handle: &ResourceHandle,
    ) -> Result<()> {
        let resource = handle.resource();
        for port in resource.exposed_ports().await {
            let mapped = resource
                .mapped_port(port)
                .await
                .map_err(|source| TestrigError::ResourceStart {
                    name: handle.name().to_string(),
                    source,
                })?;
            properties.set(&format!("{}_{}", handle.name(), port), &mapped.to_string());
        }
        let address =
            resource
                .network_address()
                .await
                .map_err(|source| TestrigError::ResourceStart {
                    name: handle.name().to_string(),
                    source,
                })?;
        properties.set(&format!("{}_HOST", handle.name()), &address);
        debug!(resource = handle.name(), address = %address, "published endpoints");
        Ok(())
    }

    async fn release_one(
        registry: Arc<ResourceRegistry>,
        handle: &ResourceHandle,
        settings: &GroupSettings,
        grace: Duration,
    ) {
        let count = registry.release(handle);
        let reuse = handle.reuse() && settings.reuse_resources;
        let running = handle.resource().is_running().await;

        if !running {
            return;
        }
        if !reuse {
            Self::stop_now(handle).await;
            return;
        }

        debug!(
            resource = handle.name(),
            count,
            grace_ms = grace.as_millis() as u64,
            "deferring stop check"
        );
        let handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            // The count is re-read here, not at schedule time, so an
            // acquire landing inside the grace interval wins.
            if registry.try_claim_stop(&handle) {
                Self::stop_now(&handle).await;
            } else {
                debug!(resource = handle.name(), "resource reacquired, leaving running");
            }
        });
    }

    async fn stop_now(handle: &ResourceHandle) {
        info!(resource = handle.name(), "stopping resource");
        if let Err(error) = handle.resource().stop().await {
            error!(resource = handle.name(), error = %error, "error stopping resource");
        }
    }
}
