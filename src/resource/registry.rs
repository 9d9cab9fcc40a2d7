//! # Resource Registry
//!
//! Process-wide reference counts per resource identity. The registry is the
//! only shared mutable state between concurrent test groups; every count
//! mutation is atomic per identity, so interleaved `acquire`/`release`
//! calls never lose updates and never drive a count negative.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use testrig_core::resource::ResourceRegistry;
//!
//! let registry = Arc::new(ResourceRegistry::new());
//! # let handle = testrig_core::resource::registry::test_support::noop_handle("POSTGRES");
//! assert_eq!(registry.acquire(&handle), 1);
//! assert_eq!(registry.acquire(&handle), 2);
//! assert_eq!(registry.release(&handle), 1);
//! assert!(!registry.try_claim_stop(&handle));
//! assert_eq!(registry.release(&handle), 0);
//! assert!(registry.try_claim_stop(&handle));
//! ```

use crate::resource::handle::ResourceHandle;
use dashmap::DashMap;

/// Reference-count table keyed by resource identity.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    counts: DashMap<String, i64>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            counts: DashMap::new(),
        }
    }

    /// Increments the count for the handle's identity, creating the entry
    /// at zero when absent. Returns the post-increment count; exactly one
    /// of any set of racing acquirers observes 1.
    pub fn acquire(&self, handle: &ResourceHandle) -> i64 {
        let mut entry = self.counts.entry(handle.name().to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Decrements the count, floored at zero. Releasing an absent or
    /// already-zero entry is a silent no-op returning 0; callers are
    /// allowed to be imprecise about pairing across overlapping groups.
    pub fn release(&self, handle: &ResourceHandle) -> i64 {
        let mut entry = self.counts.entry(handle.name().to_string()).or_insert(0);
        *entry = (*entry - 1).max(0);
        *entry
    }

    /// True only while the count is at zero at the moment of the call.
    /// Used as the final gate before an actual stop, so a release followed
    /// by an immediate reacquire never stops the resource underneath the
    /// new acquirer.
    pub fn try_claim_stop(&self, handle: &ResourceHandle) -> bool {
        self.counts
            .get(handle.name())
            .map_or(true, |count| *count <= 0)
    }

    /// Current count for an identity. Zero when the identity was never
    /// acquired.
    pub fn count(&self, name: &str) -> i64 {
        self.counts.get(name).map_or(0, |count| *count)
    }
}

#[doc(hidden)]
pub mod test_support {
    use crate::resource::handle::{ResourceHandle, TestResource};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopResource;

    #[async_trait]
    impl TestResource for NoopResource {
        async fn start(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn stop(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn is_running(&self) -> bool {
            false
        }
        async fn exposed_ports(&self) -> Vec<u16> {
            Vec::new()
        }
        async fn mapped_port(&self, port: u16) -> anyhow::Result<u16> {
            Ok(port)
        }
        async fn network_address(&self) -> anyhow::Result<String> {
            Ok("127.0.0.1".to_string())
        }
    }

    /// Handle over an inert resource, for registry-only exercises.
    pub fn noop_handle(name: &str) -> ResourceHandle {
        ResourceHandle::new(name, Arc::new(NoopResource), true)
    }
}
