//! File-backed tracing setup.
//!
//! stdout belongs to the TUI, so log records go to a file. `RUST_LOG`
//! overrides the configured level.

use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::ConsoleError;

/// Install the global subscriber writing to `log_path`.
///
/// Calling this twice is harmless: the second installation is ignored.
pub fn init_file_logging(log_path: &Path, level: &str) -> Result<(), ConsoleError> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(log_file))
        .try_init();

    Ok(())
}
