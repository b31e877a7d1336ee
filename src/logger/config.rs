/// Runtime logger configuration
///
/// Built once from the explicit `LoggingConfig` plus command-line flags, then
/// read by the filtering logic in `core`.
use std::collections::HashSet;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;
use crate::config::LoggingConfig;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Highest level that is printed (Info by default)
    pub min_level: LogLevel,
    /// Tags with debug output enabled
    pub debug_tags: HashSet<String>,
    /// Print debug output for every tag
    pub debug_all: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            debug_all: false,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    match LOGGER_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(_) => LoggerConfig::default(),
    }
}

pub fn set_logger_config(config: LoggerConfig) {
    if let Ok(mut current) = LOGGER_CONFIG.write() {
        *current = config;
    }
}

/// Merge file configuration with `--debug-<tag>`, `--verbose` and `--quiet`
pub fn init_from_config(logging: &LoggingConfig) {
    let mut config = LoggerConfig::default();

    if let Some(level) = LogLevel::from_str(&logging.min_level) {
        config.min_level = level;
    }

    config
        .debug_tags
        .extend(logging.debug_tags.iter().map(|t| t.to_lowercase()));
    config.debug_tags.extend(arguments::debug_flag_tags());
    config.debug_all = config.debug_tags.contains("all");

    if arguments::is_verbose_enabled() {
        config.min_level = LogLevel::Verbose;
    } else if arguments::is_quiet_enabled() {
        config.min_level = LogLevel::Error;
    } else if !config.debug_tags.is_empty() && config.min_level < LogLevel::Debug {
        config.min_level = LogLevel::Debug;
    }

    set_logger_config(config);
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = get_logger_config();
    config.debug_all || config.debug_tags.contains(&tag.to_debug_key())
}
