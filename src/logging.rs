//! Tracing subscriber setup for applications embedding tube-dl.
//!
//! The library itself only emits `tracing` events. Binaries and demos call
//! [`init_logging`] once at startup to get console output and, optionally, a
//! log file written through a non-blocking appender.

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
pub(crate) fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| Error::Logging(format!("Invalid log level '{}': {}", config.level, e)))
}

/// Install the global subscriber
///
/// Returns the file appender's [`WorkerGuard`] when `log_file` is set. Keep it
/// alive for the lifetime of the program, dropping it flushes and stops the
/// background writer.
///
/// # Errors
///
/// Returns [`Error::Logging`] for an invalid level or when a global subscriber
/// is already installed, and [`Error::Io`] when the log directory cannot be created.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config)?;

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            std::fs::create_dir_all(dir)?;

            let file_name = path
                .file_name()
                .ok_or_else(|| Error::Logging(format!("Invalid log file path: {:?}", path)))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging(format!("Failed to set global default subscriber: {}", e)))?;

    tracing::debug!(level = %config.level, log_file = ?config.log_file, "Logging initialized");
    Ok(guard)
}
