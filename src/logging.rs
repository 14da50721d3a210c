//! The TUI owns the terminal, so log output goes to a file next to the
//! database instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

/// Environment variable that raises the log level to `debug` when set to
/// anything other than `0`.
const DEBUG_ENV_VAR: &str = "STREAMINSIGHT_DEBUG";

pub fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create log directory")?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let level = match std::env::var(DEBUG_ENV_VAR) {
        Ok(value) if value != "0" => LevelFilter::Debug,
        _ => LevelFilter::Info,
    };

    let config = ConfigBuilder::new()
        .add_filter_allow_str(env!("CARGO_CRATE_NAME"))
        .build();

    WriteLogger::init(level, config, file).context("failed to install logger")
}
