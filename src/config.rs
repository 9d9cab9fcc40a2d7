//! # Configuration Management
//!
//! Tunables for retry, fail-fast, and resource lifecycle behavior. Values
//! are plain data read once per decision point; environment variables
//! override the defaults via [`TestrigConfig::from_env`].

use crate::error::{Result, TestrigError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Default path of the fail-fast marker, under the build output directory.
pub const DEFAULT_FAIL_FAST_MARKER: &str = "target/test-failed.lock";

/// Process-wide tunables with stated defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestrigConfig {
    /// Maximum attempts for a test unit before it is reported as failed.
    pub max_attempts: u32,
    /// Fixed delay component before the next attempt, in milliseconds.
    pub fixed_delay_ms: u64,
    /// Exclusive upper bound of the random delay component, in milliseconds.
    pub random_delay_ceiling_ms: u64,
    /// Whether a permanent unit failure trips the durable fail-fast signal.
    pub fail_fast_enabled: bool,
    /// Whether resource starts within one call fan out in parallel.
    pub parallel_start: bool,
    /// Default reuse policy applied when handles are built from this config.
    pub reuse_resources: bool,
    /// Grace interval before a released, reusable resource is re-checked
    /// for stop, in milliseconds.
    pub stop_grace_ms: u64,
    /// Location of the durable fail-fast marker.
    pub fail_fast_marker: PathBuf,
}

impl Default for TestrigConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            fixed_delay_ms: 1000,
            random_delay_ceiling_ms: 10_000,
            fail_fast_enabled: false,
            parallel_start: true,
            reuse_resources: true,
            stop_grace_ms: 10_000,
            fail_fast_marker: PathBuf::from(DEFAULT_FAIL_FAST_MARKER),
        }
    }
}

impl TestrigConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(max_attempts) = parse_env("TESTRIG_MAX_ATTEMPTS")? {
            config.max_attempts = max_attempts;
        }
        if let Some(fixed_delay) = parse_env("TESTRIG_FIXED_DELAY_MS")? {
            config.fixed_delay_ms = fixed_delay;
        }
        if let Some(ceiling) = parse_env("TESTRIG_RANDOM_DELAY_CEILING_MS")? {
            config.random_delay_ceiling_ms = ceiling;
        }
        if let Some(fail_fast) = parse_env("TESTRIG_FAIL_FAST_ENABLED")? {
            config.fail_fast_enabled = fail_fast;
        }
        if let Some(parallel) = parse_env("TESTRIG_PARALLEL_START")? {
            config.parallel_start = parallel;
        }
        if let Some(reuse) = parse_env("TESTRIG_REUSE_RESOURCES")? {
            config.reuse_resources = reuse;
        }
        if let Some(grace) = parse_env("TESTRIG_STOP_GRACE_MS")? {
            config.stop_grace_ms = grace;
        }
        if let Ok(marker) = std::env::var("TESTRIG_FAIL_FAST_MARKER") {
            config.fail_fast_marker = PathBuf::from(marker);
        }

        Ok(config)
    }
}

/// Per-test-group settings, supplied explicitly at group-setup time by the
/// framework adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSettings {
    /// Whether this group's resource starts and stops fan out in parallel.
    pub parallel_start: bool,
    /// Whether this group's resources may outlive the group. A handle is
    /// only reused when both the handle and the group allow it.
    pub reuse_resources: bool,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            parallel_start: true,
            reuse_resources: true,
        }
    }
}

impl GroupSettings {
    pub fn from_config(config: &TestrigConfig) -> Self {
        Self {
            parallel_start: config.parallel_start,
            reuse_resources: config.reuse_resources,
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value.parse().map(Some).map_err(|error| {
            TestrigError::Configuration(format!("invalid {name} '{value}': {error}"))
        }),
        Err(_) => Ok(None),
    }
}
