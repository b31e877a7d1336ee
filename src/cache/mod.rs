//! Request cache
//!
//! Persists the [`TokenMap`] between runs at `<directory>/<key>_cache.json`.
//! Neither direction ever fails the run: an unreadable file loads as an empty
//! map and a failed write is logged and skipped.

pub mod storage;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::CacheConfig;
use crate::errors::SnapshotResult;
use crate::logger::{self, LogTag};
use crate::paths::{ensure_directory, get_cache_file_path};
use crate::types::TokenMap;

pub use storage::{CacheSchema, CACHE_SCHEMA_VERSION};

#[derive(Debug, Clone)]
pub struct RequestCache {
    directory: PathBuf,
}

impl RequestCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(&config.directory)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        get_cache_file_path(&self.directory, key)
    }

    /// Load the map stored under `key`; any failure yields an empty map
    pub fn load(&self, key: &str) -> TokenMap {
        let path = self.path_for(key);
        if !path.exists() {
            logger::debug(
                LogTag::Cache,
                &format!("No cache file at {}, starting empty", path.display()),
            );
            return TokenMap::new();
        }

        match self.read(&path) {
            Ok((tokens, schema)) => {
                if schema == CacheSchema::Legacy {
                    logger::info(
                        LogTag::Cache,
                        &format!(
                            "Migrating legacy cache {} ({} tokens) to schema v{}",
                            path.display(),
                            tokens.len(),
                            CACHE_SCHEMA_VERSION
                        ),
                    );
                }
                logger::debug(
                    LogTag::Cache,
                    &format!("Loaded {} tokens from {}", tokens.len(), path.display()),
                );
                tokens
            }
            Err(e) => {
                logger::error(
                    LogTag::Cache,
                    &format!("Unable to read cache {}: {}", path.display(), e),
                );
                TokenMap::new()
            }
        }
    }

    fn read(&self, path: &Path) -> SnapshotResult<(TokenMap, CacheSchema)> {
        let contents = std::fs::read_to_string(path)?;
        storage::decode_document(&contents)
    }

    /// Persist the full map under `key`; returns whether the write succeeded
    pub fn save(&self, key: &str, tokens: &TokenMap) -> bool {
        let path = self.path_for(key);
        match self.write(&path, tokens) {
            Ok(()) => {
                logger::debug(
                    LogTag::Cache,
                    &format!("Saved {} tokens to {}", tokens.len(), path.display()),
                );
                true
            }
            Err(e) => {
                logger::warning(
                    LogTag::Cache,
                    &format!("Unable to write cache {}: {}", path.display(), e),
                );
                false
            }
        }
    }

    fn write(&self, path: &Path, tokens: &TokenMap) -> SnapshotResult<()> {
        ensure_directory(&self.directory)?;
        let contents = storage::encode_document(tokens)?;
        storage::write_atomic(path, &contents)
    }
}

/// Drop records whose token is not in `current`; returns how many were removed
pub fn prune_stale<S: AsRef<str>>(tokens: &mut TokenMap, current: &[S]) -> usize {
    let keep: HashSet<&str> = current.iter().map(|t| t.as_ref()).collect();
    let removed = tokens.retain(|record| keep.contains(record.token.as_str()));
    if removed > 0 {
        logger::info(
            LogTag::Cache,
            &format!("Pruned {} stale tokens not in the current list", removed),
        );
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attribute, HolderInfo, OffChainMetadata, TokenField};
    use tempfile::TempDir;

    fn sample_map() -> TokenMap {
        let mut tokens = TokenMap::new();
        tokens.seed(["MintB", "MintA", "MintC"]);

        let b = tokens.get_mut("MintB").unwrap();
        b.holders = Some(HolderInfo {
            owner: "WalletB".to_string(),
            amount: "1".to_string(),
            token_account: Some("AccountB".to_string()),
            decimals: Some(0),
        });
        b.arweave = Some(OffChainMetadata {
            attributes: Some(vec![Attribute::new("Eyes", Some("Blue"))]),
            ..Default::default()
        });

        tokens.get_mut("MintC").unwrap().arweave = Some(OffChainMetadata::unavailable());
        tokens
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = RequestCache::new(dir.path().join("nested/cache"));
        let tokens = sample_map();

        assert!(cache.save("mindfolk", &tokens));
        assert!(cache.path_for("mindfolk").ends_with("mindfolk_cache.json"));

        let loaded = cache.load("mindfolk");
        assert_eq!(loaded, tokens);
        assert_eq!(loaded.tokens().collect::<Vec<_>>(), vec!["MintB", "MintA", "MintC"]);
        for field in [TokenField::Holders, TokenField::Account, TokenField::OffChain] {
            assert_eq!(loaded.missing(field), tokens.missing(field));
        }
    }

    #[test]
    fn missing_or_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let cache = RequestCache::new(dir.path());

        assert!(cache.load("absent").is_empty());

        std::fs::write(cache.path_for("broken"), "{ not json").unwrap();
        assert!(cache.load("broken").is_empty());
    }

    #[test]
    fn failed_save_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        // Directory path is an existing regular file
        let cache = RequestCache::new(blocker.join("sub"));
        assert!(!cache.save("key", &sample_map()));
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let cache = RequestCache::new(dir.path());
        assert!(cache.save("k", &sample_map()));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["k_cache.json".to_string()]);
    }

    #[test]
    fn prune_removes_only_unlisted_tokens() {
        let mut tokens = sample_map();
        let removed = prune_stale(&mut tokens, &["MintA", "MintC", "MintZ"]);
        assert_eq!(removed, 1);
        assert_eq!(tokens.tokens().collect::<Vec<_>>(), vec!["MintA", "MintC"]);
    }
}
