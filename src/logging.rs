//! Log file naming, subscriber setup and pruning of old log files

use crate::error::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Prefix shared by every log file the binary writes
pub const LOG_PREFIX: &str = "scraper_";

/// Extension of log files
pub const LOG_EXTENSION: &str = ".log";

/// Number of log files kept by [`prune_logs`] unless told otherwise
pub const DEFAULT_KEEP: usize = 5;

/// Log file name for a given day, e.g. `scraper_20261018.log`
pub fn log_file_name(date: NaiveDate) -> String {
    format!("{}{}{}", LOG_PREFIX, date.format("%Y%m%d"), LOG_EXTENSION)
}

fn is_log_file(name: &str) -> bool {
    name.starts_with(LOG_PREFIX) && name.ends_with(LOG_EXTENSION)
}

/// Install the global subscriber: console output plus an appending file in
/// `logs_dir`
///
/// The filter comes from `RUST_LOG` and defaults to `info`. If the log file
/// cannot be opened only the console layer is installed. Returns the path of
/// the file being written, if any.
pub fn init_tracing(logs_dir: &Path) -> Option<PathBuf> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let path = logs_dir.join(log_file_name(chrono::Local::now().date_naive()));
    let file = std::fs::create_dir_all(logs_dir).and_then(|_| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    });

    match file {
        Ok(file) => {
            let _ = tracing_subscriber::registry()
                .with(filter())
                .with(tracing_subscriber::fmt::layer())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init();
            Some(path)
        }
        Err(e) => {
            eprintln!("Failed to open log file {}: {e}", path.display());
            let _ = tracing_subscriber::fmt().with_env_filter(filter()).try_init();
            None
        }
    }
}

/// Delete all but the newest `keep` log files in `dir`
///
/// Files are ordered by name, which sorts by date given the
/// `scraper_YYYYMMDD.log` pattern. Other files are left alone. A missing
/// directory has nothing to prune. Returns the deleted paths.
pub fn prune_logs(dir: &Path, keep: usize) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut logs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter(|entry| entry.file_name().to_str().is_some_and(is_log_file))
        .map(|entry| entry.path())
        .collect();
    logs.sort();

    let excess = logs.len().saturating_sub(keep);
    let mut removed = Vec::with_capacity(excess);
    for path in logs.into_iter().take(excess) {
        std::fs::remove_file(&path)?;
        tracing::info!(path = %path.display(), "removed old log file");
        removed.push(path);
    }

    Ok(removed)
}
