//! Tracing setup: JSON to stdout plus a daily log file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::AppError;

/// Prefix of the daily log files, e.g. `stock-relay.2025-07-29.log`.
const LOG_FILE_PREFIX: &str = "stock-relay";

/// Installs the global subscriber. The returned guard flushes the file
/// writer on drop and must be held for the life of the process.
///
/// # Errors
///
/// Returns `AppError::Logging` if the log directory cannot be created or a
/// subscriber is already installed.
pub fn init(log_dir: &Path) -> Result<WorkerGuard, AppError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        AppError::Logging(format!(
            "failed to create log directory {}: {e}",
            log_dir.display()
        ))
    })?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| AppError::Logging(format!("failed to open log file: {e}")))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .with(fmt::layer().json().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(guard)
}
