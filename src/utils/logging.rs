use anyhow::{Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::utils::app_paths::AppPaths;

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "ATLONA_LOG";

/// Timestamped log file name, one per process
pub fn log_file_name() -> String {
    format!("atlona-ctl_{}.log", Local::now().format("%Y%m%d_%H%M%S"))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber: compact output on stderr (warnings only
/// unless `verbose`) plus everything the filter lets through in a log file
/// under `log_dir`. Returns the log file path.
pub fn init_tracing_in(log_dir: &Path, verbose: bool) -> Result<PathBuf> {
    let log_path = log_dir.join(log_file_name());
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let stderr_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr.with_max_level(stderr_level))
        .with_target(true)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    tracing::debug!(target: "atlona::logging", "Logging to {}", log_path.display());
    Ok(log_path)
}

pub fn init_tracing(verbose: bool) -> Result<PathBuf> {
    init_tracing_in(&AppPaths::log_dir()?, verbose)
}
