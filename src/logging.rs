//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to both console and
//! files, for debugging interleaved resource lifecycles and retry loops
//! across concurrent test groups.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call from every test group; only the first call does anything,
/// and an already-installed global subscriber is tolerated.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let log_dir = PathBuf::from("log");
        if !log_dir.exists() {
            fs::create_dir_all(&log_dir).expect("Failed to create log directory");
        }

        // Log file name carries environment, PID, and timestamp so parallel
        // suite processes never collide.
        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");
        let log_path = log_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_filter(EnvFilter::new(log_level.clone())),
            )
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(EnvFilter::new(log_level)),
            );

        // Another harness layer may already own the global subscriber.
        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized, continuing");
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_path.display(),
            "structured logging initialized"
        );

        // The writer guard must outlive the process for the file layer to
        // keep flushing.
        std::mem::forget(guard);
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("TESTRIG_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "test".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    })
}
