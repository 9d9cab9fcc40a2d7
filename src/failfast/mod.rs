//! # Fail-Fast Signal
//!
//! A durable, set-once boolean recording that some test unit in the run
//! has already failed permanently. The marker is materialized on disk
//! under the build output directory so sibling test processes in the same
//! build observe it too; a fresh build starts clear because build cleanup
//! removes the output directory, never this crate.
//!
//! The gate is checked before every unit runs (skip outright) and between
//! retry attempts (stop retrying), which realizes stop-the-world semantics
//! without any central scheduler.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

use crate::config::TestrigConfig;

/// Reason attached to skipped units once the signal is set.
pub const SKIP_REASON: &str = "a test has already failed, skipping remaining tests";

/// Durable existence-only boolean storage.
///
/// Kept as a seam so single-process harnesses can swap the marker file for
/// an in-memory flag.
pub trait MarkerStore: Send + Sync {
    fn exists(&self) -> bool;

    /// Creates the marker; racing with another concurrent creator must
    /// succeed on both sides.
    fn create_if_absent(&self) -> io::Result<()>;
}

/// Marker file under the build output directory.
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl MarkerStore for FileMarker {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn create_if_absent(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(error) => Err(error),
        }
    }
}

/// In-memory flag for single-process harnesses.
#[derive(Debug, Default)]
pub struct MemoryMarker {
    set: AtomicBool,
}

impl MarkerStore for MemoryMarker {
    fn exists(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    fn create_if_absent(&self) -> io::Result<()> {
        self.set.store(true, Ordering::Release);
        Ok(())
    }
}

/// Outcome of the pre-unit gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunDecision {
    Proceed,
    Skip { reason: String },
}

/// Cross-run "has any test already failed" flag with set-once semantics.
pub struct FailFastSignal {
    store: Box<dyn MarkerStore>,
    enabled: bool,
}

impl FailFastSignal {
    pub fn new(store: Box<dyn MarkerStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// File-backed signal at the configured marker path.
    pub fn from_config(config: &TestrigConfig) -> Self {
        Self::new(
            Box::new(FileMarker::new(config.fail_fast_marker.clone())),
            config.fail_fast_enabled,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a failure has been recorded in this run.
    pub fn has_failed(&self) -> bool {
        self.store.exists()
    }

    /// Records a permanent failure. Idempotent; a no-op while fail-fast is
    /// disabled.
    pub fn record_failure(&self) {
        if !self.enabled {
            return;
        }
        match self.store.create_if_absent() {
            Ok(()) => info!("fail-fast signal recorded"),
            Err(create_error) => {
                error!(error = %create_error, "error recording fail-fast signal");
            }
        }
    }

    /// Pre-unit gate: skip the unit once the signal is set.
    pub fn check(&self) -> RunDecision {
        if self.has_failed() {
            RunDecision::Skip {
                reason: SKIP_REASON.to_string(),
            }
        } else {
            RunDecision::Proceed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_idempotent_and_set_once() {
        let signal = FailFastSignal::new(Box::new(MemoryMarker::default()), true);
        assert!(!signal.has_failed());
        signal.record_failure();
        signal.record_failure();
        assert!(signal.has_failed());
        assert_eq!(
            signal.check(),
            RunDecision::Skip {
                reason: SKIP_REASON.to_string()
            }
        );
    }

    #[test]
    fn disabled_signal_never_records() {
        let signal = FailFastSignal::new(Box::new(MemoryMarker::default()), false);
        signal.record_failure();
        assert!(!signal.has_failed());
        assert_eq!(signal.check(), RunDecision::Proceed);
    }

    #[test]
    fn file_marker_tolerates_concurrent_creators() {
        let dir = tempfile::tempdir().unwrap();
        let marker = FileMarker::new(dir.path().join("out/test-failed.lock"));
        assert!(!marker.exists());
        marker.create_if_absent().unwrap();
        // A second creator finding the file already present is a success.
        marker.create_if_absent().unwrap();
        assert!(marker.exists());
    }

    #[test]
    fn file_backed_signal_survives_separate_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test-failed.lock");

        let first = FailFastSignal::new(Box::new(FileMarker::new(&path)), true);
        first.record_failure();

        // A signal constructed later in another process would see the same
        // marker.
        let second = FailFastSignal::new(Box::new(FileMarker::new(&path)), true);
        assert!(second.has_failed());
    }
}
