//! # Resource Handles
//!
//! A [`ResourceHandle`] names one shared external resource and carries the
//! capability used to drive it. The capability is the only contact surface
//! with the actual runtime (containers, local daemons, in-memory fakes);
//! the coordinators never reach past it.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Capability interface over one external resource instance.
///
/// `start` errors surface as coordinator-level failures; `stop` errors are
/// logged and swallowed by the callers.
#[async_trait]
pub trait TestResource: Send + Sync {
    async fn start(&self) -> anyhow::Result<()>;

    async fn stop(&self) -> anyhow::Result<()>;

    async fn is_running(&self) -> bool;

    /// Ports the resource declares, in its own network namespace.
    async fn exposed_ports(&self) -> Vec<u16>;

    /// Externally reachable port mapped to `port`.
    async fn mapped_port(&self, port: u16) -> anyhow::Result<u16>;

    /// Externally reachable address of the resource.
    async fn network_address(&self) -> anyhow::Result<String>;
}

/// Identity and policy for one shared resource.
///
/// Created once per distinct resource at suite definition time and cloned
/// into every group that references it; clones share the same underlying
/// capability. The name doubles as the registry key and as the prefix of
/// the published endpoint properties (`<NAME>_<port>`, `<NAME>_HOST`).
#[derive(Clone)]
pub struct ResourceHandle {
    name: String,
    resource: Arc<dyn TestResource>,
    reuse: bool,
}

impl ResourceHandle {
    pub fn new(name: impl Into<String>, resource: Arc<dyn TestResource>, reuse: bool) -> Self {
        Self {
            name: name.into(),
            resource,
            reuse,
        }
    }

    /// Stable identity of the resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this resource may outlive a single test group.
    pub fn reuse(&self) -> bool {
        self.reuse
    }

    pub fn resource(&self) -> &Arc<dyn TestResource> {
        &self.resource
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("name", &self.name)
            .field("reuse", &self.reuse)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::resource::registry::test_support::noop_handle;

    #[test]
    fn clones_share_identity_and_capability() {
        let handle = noop_handle("POSTGRES");
        let clone = handle.clone();
        assert_eq!(handle.name(), clone.name());
        assert_eq!(handle.reuse(), clone.reuse());

        let mapped = tokio_test::block_on(clone.resource().mapped_port(5432)).unwrap();
        assert_eq!(mapped, 5432);
        assert!(format!("{handle:?}").contains("POSTGRES"));
    }
}
