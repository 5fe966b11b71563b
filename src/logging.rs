//! Logging setup for the scrubline binary.
//!
//! Logs go to the console (stderr, so stdout stays free for command output)
//! and to a daily-rolling file in the log directory.
//!
//! ## Usage
//!
//! ```no_run
//! use scrubline::config::Settings;
//! use scrubline::logging;
//!
//! logging::init(&Settings::default(), false).expect("Failed to initialize logging");
//! tracing::info!("ready");
//! ```

use crate::config::{APP_DIR, Settings};
use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Gets the log directory, creating it if needed.
///
/// Uses `settings.log_dir` when set, otherwise the platform data directory:
/// - Windows: `%APPDATA%/scrubline/logs`
/// - macOS: `~/Library/Application Support/scrubline/logs`
/// - Linux: `~/.local/share/scrubline/logs`
pub fn get_log_dir(settings: &Settings) -> Result<PathBuf> {
    let log_dir = match &settings.log_dir {
        Some(dir) => dir.clone(),
        None => dirs::data_dir()
            .context("Failed to determine data directory")?
            .join(APP_DIR)
            .join("logs"),
    };

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(settings: &Settings, verbose: bool) -> &str {
    if verbose { "debug" } else { &settings.log_level }
}

/// Initializes console and rolling-file logging.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, the file appender
/// fails or the configured level is not a valid filter.
pub fn init(settings: &Settings, verbose: bool) -> Result<()> {
    let log_dir = get_log_dir(settings)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(APP_DIR)
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create log file appender")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(settings, verbose)))
        .context("Failed to create env filter")?;

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("Logging initialized, log directory: {}", log_dir.display());

    Ok(())
}
