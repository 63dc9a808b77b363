//! Tracing setup. The terminal belongs to the TUI, so events are appended to
//! a log file in the data directory instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "DAILY_BREAD_LOG";
const LOG_FILE_NAME: &str = "daily-bread.log";

/// Install the global subscriber writing to `<data_dir>/daily-bread.log`.
/// Returns the log file path so the caller can mention it on startup errors.
pub fn init(data_dir: &Path, default_filter: &str) -> Result<PathBuf> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;
    let path = data_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|error| anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(path)
}
