//! # Endpoint Property Surface
//!
//! After a resource starts, its reachable endpoints are published as named
//! key/value pairs for test bodies to look up: `<NAME>_<port>` holds the
//! mapped port and `<NAME>_HOST` the reachable address. The sink is a seam
//! so harness tests can capture publications without touching the process
//! environment.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Process-wide key/value surface consumed by test bodies.
pub trait PropertySink: Send + Sync {
    fn set(&self, key: &str, value: &str);

    fn get(&self, key: &str) -> Option<String>;
}

/// Publishes to the process environment, the surface tests actually read.
#[derive(Debug, Default)]
pub struct EnvProperties;

impl PropertySink for EnvProperties {
    fn set(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory sink for harness tests.
#[derive(Debug, Default)]
pub struct MemoryProperties {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl PropertySink for MemoryProperties {
    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}
