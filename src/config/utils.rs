/// Configuration loading and validation
///
/// Configuration is loaded once, validated, and handed to components by
/// reference; nothing here keeps global state.
use std::path::Path;

use super::schemas::SnapshotConfig;
use crate::errors::{SnapshotError, SnapshotResult};

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "nftsnapshot.toml";

/// Load configuration from a specific file path
///
/// A missing file yields the defaults; an unreadable or invalid file is an error.
pub fn load_config_from_path(path: &Path) -> SnapshotResult<SnapshotConfig> {
    if !path.exists() {
        return Ok(SnapshotConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        SnapshotError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
    })?;

    let config = parse_config(&contents).map_err(|e| match e {
        SnapshotError::Config(msg) => {
            SnapshotError::Config(format!("{} (in '{}')", msg, path.display()))
        }
        other => other,
    })?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(contents: &str) -> SnapshotResult<SnapshotConfig> {
    let config = toml::from_str::<SnapshotConfig>(contents)
        .map_err(|e| SnapshotError::Config(format!("Failed to parse config: {}", e)))?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject values that would stall or disable fetching entirely
pub fn validate_config(config: &SnapshotConfig) -> SnapshotResult<()> {
    if config.rpc.url.trim().is_empty() {
        return Err(SnapshotError::Config("rpc.url must not be empty".to_string()));
    }
    if config.rpc.requests_per_window == 0 || config.http.requests_per_window == 0 {
        return Err(SnapshotError::Config(
            "requests_per_window must be at least 1".to_string(),
        ));
    }
    if config.rpc.window_ms == 0 || config.http.window_ms == 0 {
        return Err(SnapshotError::Config("window_ms must be at least 1".to_string()));
    }
    if config.enrich.max_in_flight == 0 {
        return Err(SnapshotError::Config(
            "enrich.max_in_flight must be at least 1".to_string(),
        ));
    }
    if config.http.retry_base_delay_ms > config.http.retry_max_delay_ms {
        return Err(SnapshotError::Config(
            "http.retry_base_delay_ms exceeds http.retry_max_delay_ms".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [rpc]
            url = "http://127.0.0.1:8899"

            [cache]
            directory = "/tmp/snapshots"
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc.url, "http://127.0.0.1:8899");
        assert_eq!(config.rpc.requests_per_window, 100);
        assert_eq!(config.cache.directory, "/tmp/snapshots");
        assert!(!config.cache.prune_stale);
        assert_eq!(config.http.retry_base_delay_ms, 3000);
        assert_eq!(config.enrich.max_in_flight, 100);
    }

    #[test]
    fn rejects_zero_rate() {
        let err = parse_config("[http]\nrequests_per_window = 0\n").unwrap_err();
        assert!(matches!(err, SnapshotError::Config(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, SnapshotConfig::default());
    }
}
