//! Tracing subscriber setup shared by the binaries.

use crate::config::LoggingConfig;
use crate::error::{Result, SentioError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Default filter when `RUST_LOG` is unset; keeps ONNX Runtime quiet.
pub const DEFAULT_FILTER: &str = "sentio=info,sentio_model=info,ort=warn";

/// Install the global subscriber: stderr always, plus a daily-rotated file
/// under `config.log_dir` when set.
///
/// Keep the returned guard alive for the life of the process or buffered
/// file output is lost. Calling this twice leaves the first subscriber in
/// place and returns `None`, since no file layer was installed.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("sentio")
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| SentioError::Config(format!("log file setup failed: {e}")))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
    {
        tracing::warn!("logging already initialised, keeping existing subscriber: {e}");
        return Ok(None);
    }

    Ok(guard)
}
