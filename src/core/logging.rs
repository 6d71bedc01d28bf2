//! Logging Module
//!
//! Structured logging through `tracing`:
//! - JSON lines to a daily-rolling file for later ingestion
//! - pretty, human-readable output on stderr
//! - standard `log` macros bridged into `tracing`

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File name prefix of the rolling log files
pub const LOG_FILE_PREFIX: &str = "lanternwave.log";

/// Initialize the logging system.
///
/// `default_filter` applies when `RUST_LOG` is unset or invalid.
///
/// Returns a `WorkerGuard` which must be kept alive for the duration of the application
/// to ensure buffered logs are flushed on shutdown.
pub fn init(log_dir: &Path, default_filter: &str) -> WorkerGuard {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // File Layer: JSON format for easy parsing/ingestion
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(build_filter(default_filter));

    // Console Layer: stderr, stdout carries command output
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .pretty()
        .with_filter(build_filter(default_filter));

    if tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Global tracing subscriber already installed");
    }

    // `try_init` installs the bridge itself when tracing-subscriber has its default features
    if tracing_log::LogTracer::init().is_err() {
        tracing::debug!("log bridge already installed");
    }

    tracing::info!(
        log_file = %log_dir.join(LOG_FILE_PREFIX).display(),
        "Logging initialized (daily rolling)"
    );

    guard
}

fn build_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
