//! File logging; the terminal belongs to the overlay so nothing goes to stderr

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::app_dirs::AppDirs;
use crate::error::Result;

pub const LOG_ENV: &str = "MICROTASKRR_LOG";
const LOG_FILE: &str = "microtaskrr.log";

/// Initialize the logging subsystem
///
/// Logs roll daily under the state directory (see [`AppDirs::log_dir`]).
/// Level is controlled by the `MICROTASKRR_LOG` environment variable.
///
/// # Examples
/// ```bash
/// MICROTASKRR_LOG=debug microtaskrr
/// ```
pub fn init() -> Result<PathBuf> {
    let log_dir = log_directory();
    init_in(&log_dir)?;
    Ok(log_dir)
}

pub fn init_in(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE);

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("microtaskrr=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "microtaskrr starting");
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

fn log_directory() -> PathBuf {
    AppDirs::log_dir().unwrap_or_else(|| PathBuf::from("."))
}
