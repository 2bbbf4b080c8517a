//! CLI command implementations

pub mod collections;
pub mod logs;
pub mod upload;

use std::path::PathBuf;

use anyhow::{Context, Result};
use staybook_core::services::{EntryPoint, LogEvent, LoggingService};
use staybook_core::StaybookContext;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let staybook_dir = get_staybook_dir().ok()?;
    std::fs::create_dir_all(&staybook_dir).ok()?;
    LoggingService::new(&staybook_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the staybook directory from `STAYBOOK_DIR` or `~/.staybook`
pub fn get_staybook_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STAYBOOK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".staybook"))
}

/// Open the store and services
pub fn get_context() -> Result<StaybookContext> {
    let staybook_dir = get_staybook_dir()?;
    StaybookContext::new(&staybook_dir).context("Failed to initialize staybook context")
}
