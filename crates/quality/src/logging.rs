//! Logging setup for the quality evaluation.
//!
//! The quality log file is the primary output of a run: step-level row
//! counts at DEBUG, per-window verdicts at INFO/ERROR. Stderr gets a copy
//! for interactive runs.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with file output.
///
/// Returns a guard that must be held for the lifetime of the run to ensure
/// the quality log is flushed.
pub fn init_logging(log_path: &Path) -> io::Result<WorkerGuard> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    // step-level counts go to the file by default, hence debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wsal_quality=debug,wsal_core=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(true))
        .init();

    tracing::info!(log_path = %log_path.display(), "quality logging initialized");

    Ok(guard)
}
