//! # Canned Resource Images
//!
//! Descriptors for the infrastructure images integration suites lean on
//! most. A [`ResourceImage`] is plain data consumed by whatever runtime
//! adapter turns it into a live [`super::TestResource`]; nothing here talks
//! to a container engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default user provisioned in the preset images.
pub const TEST_USER_NAME: &str = "test";

/// Default password provisioned in the preset images.
pub const TEST_USER_PASSWORD: &str = "test";

/// Image descriptor for one external resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceImage {
    pub image: String,
    pub tag: String,
    pub exposed_ports: Vec<u16>,
    pub env: HashMap<String, String>,
    pub command: Vec<String>,
}

impl ResourceImage {
    pub fn new(image: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            tag: tag.into(),
            exposed_ports: Vec::new(),
            env: HashMap::new(),
            command: Vec::new(),
        }
    }

    pub fn with_exposed_port(mut self, port: u16) -> Self {
        self.exposed_ports.push(port);
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_command(mut self, command: &[&str]) -> Self {
        self.command = command.iter().map(|part| (*part).to_string()).collect();
        self
    }

    /// Full image reference, `image:tag`.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}

/// Transactional repository (PostgreSQL) preset.
pub fn postgres() -> ResourceImage {
    ResourceImage::new("coldis/infrastructure-transactional-repository", "5.0.7")
        .with_exposed_port(5432)
        .with_env("ENABLE_JSON_CAST", "true")
        .with_env("ENABLE_UNACCENT", "true")
        .with_env("POSTGRES_ADMIN_USER", "postgres")
        .with_env("POSTGRES_ADMIN_PASSWORD", "postgres")
        .with_env("REPLICATOR_USER_NAME", "replicator")
        .with_env("REPLICATOR_USER_PASSWORD", "replicator")
        .with_env("POSTGRES_DEFAULT_USER", TEST_USER_NAME)
        .with_env("POSTGRES_DEFAULT_PASSWORD", TEST_USER_PASSWORD)
        .with_env("POSTGRES_DEFAULT_DATABASE", TEST_USER_NAME)
}

/// Messaging service (Artemis broker) preset.
pub fn artemis() -> ResourceImage {
    ResourceImage::new("coldis/infrastructure-messaging-service", "2.22")
        .with_exposed_port(8161)
        .with_exposed_port(61616)
        .with_env("ARTEMIS_USERNAME", TEST_USER_NAME)
        .with_env("ARTEMIS_PASSWORD", TEST_USER_PASSWORD)
        .with_env("ARTEMIS_PERF_JOURNAL", "ALWAYS")
}

/// Cache service (Redis) preset.
pub fn redis() -> ResourceImage {
    ResourceImage::new("redis", "7.2.4-bookworm")
        .with_exposed_port(6379)
        .with_command(&["redis-server", "--save", "60", "1", "--loglevel", "warning"])
}
