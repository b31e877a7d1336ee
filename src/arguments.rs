/// Centralized argument handling for nftsnapshot
///
/// The binary parses its options with clap; this module keeps a copy of the raw
/// command line so the logger can pick up `--debug-<tag>` and `--verbose` flags
/// without every caller threading them through.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => {
            // Fallback to env::args if mutex is poisoned
            env::args().collect()
        }
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Collects every `--debug-<tag>` suffix present on the command line
pub fn debug_flag_tags() -> Vec<String> {
    get_cmd_args()
        .iter()
        .filter_map(|a| a.strip_prefix("--debug-"))
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_lowercase())
        .collect()
}

/// Verbose logging for every tag
pub fn is_verbose_enabled() -> bool {
    has_arg("--verbose") || has_arg("-v")
}

/// Suppress warnings and info output
pub fn is_quiet_enabled() -> bool {
    has_arg("--quiet")
}
