//! Logging setup: stderr plus a daily-rolled file in the log directory.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::{MailboyError, Result};

/// File name prefix of the rolled log files.
pub const LOG_FILE_NAME: &str = "mailboy.log";

/// Installs the global subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. The returned
/// guard flushes the file writer when dropped, so keep it alive until exit.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        MailboyError::Logging(format!(
            "cannot create log directory '{}': {}",
            log_dir.display(),
            e
        ))
    })?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| MailboyError::Logging(e.to_string()))?;

    Ok(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
