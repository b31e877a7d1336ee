//! Structured logging for nftsnapshot
//!
//! Tagged, leveled logging with colored console output and an optional plain
//! text log file:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-subsystem debug control via `--debug-<tag>` flags or `logging.debug_tags`
//! - Dual output: colored console + file persistence
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nftsnapshot::logger::{self, LogTag};
//!
//! logger::error(LogTag::Cache, "Unable to write cache file");
//! logger::info(LogTag::Enrich, "Populating holders details...");
//! logger::debug(LogTag::Rpc, "getAccountInfo ..."); // Only with --debug-rpc
//! ```
//!
//! Call [`init`] once at startup with the resolved [`LoggingConfig`].

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

use crate::config::LoggingConfig;

/// Initialize the logger system
///
/// Combines the explicit logging configuration with `--debug-<tag>`,
/// `--verbose` and `--quiet` flags from the command line, then opens the log
/// file (if one is configured).
pub fn init(logging: &LoggingConfig) {
    config::init_from_config(logging);
    file::init_file_logging(&logging.file);
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the tag's debug mode is on (`--debug-rpc`, `--debug-cache`, ...).
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush pending log writes
pub fn flush() {
    file::flush_file_logging();
}
