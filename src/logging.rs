//! Log file set-up.
//!
//! Installs a `tracing` fmt subscriber that appends plain lines to
//! `[logging].path`:
//!
//! ```text
//! 2026-03-01T10:15:02.417Z  INFO batch{run_id=...}: qagen::task: Processing file: in/a.pdf
//! ```
//!
//! `RUST_LOG` takes precedence over `[logging].level`. Once installed,
//! panics raised on worker threads (pdf-extract panics on some malformed
//! files) are written to the log instead of stderr.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub fn init(config: &LoggingConfig) -> Result<()> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory: {}", parent.display())
            })?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.path)
        .with_context(|| format!("Failed to open log file: {}", config.path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    log_panics();
    Ok(())
}

/// Routes panic reports to the log. Panics on the main thread are still
/// printed to stderr as well.
fn log_panics() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("unnamed");
        error!("Thread '{}' {}", name, info);
        if name == "main" {
            default_hook(info);
        }
    }));
}
