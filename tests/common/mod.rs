//! Shared fixtures for the lifecycle and retry scenario tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use testrig_core::TestResource;

/// Controllable in-memory resource with start/stop counters.
///
/// `start` on an already-running instance is a no-op, like any sane
/// external runtime; `starts()` therefore counts cold starts only.
pub struct FakeResource {
    ports: Vec<u16>,
    running: AtomicBool,
    starts: AtomicU32,
    stops: AtomicU32,
    start_failures_left: AtomicU32,
}

impl FakeResource {
    pub fn new(ports: &[u16]) -> Arc<Self> {
        Arc::new(Self {
            ports: ports.to_vec(),
            running: AtomicBool::new(false),
            starts: AtomicU32::new(0),
            stops: AtomicU32::new(0),
            start_failures_left: AtomicU32::new(0),
        })
    }

    /// Resource whose first `failures` start calls fail.
    pub fn failing_starts(ports: &[u16], failures: u32) -> Arc<Self> {
        let resource = Self::new(ports);
        resource.start_failures_left.store(failures, Ordering::SeqCst);
        resource
    }

    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_up(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestResource for FakeResource {
    async fn start(&self) -> anyhow::Result<()> {
        let left = self.start_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.start_failures_left.store(left - 1, Ordering::SeqCst);
            anyhow::bail!("runtime refused to start the instance");
        }
        if !self.running.swap(true, Ordering::SeqCst) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn exposed_ports(&self) -> Vec<u16> {
        self.ports.clone()
    }

    async fn mapped_port(&self, port: u16) -> anyhow::Result<u16> {
        Ok(30_000 + port % 10_000)
    }

    async fn network_address(&self) -> anyhow::Result<String> {
        Ok("172.17.0.2".to_string())
    }
}
