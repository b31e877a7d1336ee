//! Path resolution for nftsnapshot
//!
//! All file locations derive from the explicit configuration; nothing here is
//! resolved from global state.
//!
//! ```text
//! <cache.directory>/
//! └── <key>_cache.json     (one full-map snapshot per cache key)
//! <logging.file>           (plain-text log, app.log by default)
//! <--file>                 (CSV snapshot, snapshot.csv by default)
//! ```

use std::path::{Path, PathBuf};

/// Suffix appended to the cache key to form the cache file name
pub const CACHE_FILE_SUFFIX: &str = "_cache.json";

/// Returns `<cache_dir>/<key>_cache.json`
pub fn get_cache_file_path(cache_dir: &Path, key: &str) -> PathBuf {
  cache_dir.join(format!("{}{}", key, CACHE_FILE_SUFFIX))
}

/// Temporary sibling written before the atomic rename over the cache file
pub fn get_cache_temp_path(cache_file: &Path) -> PathBuf {
  let mut name = cache_file
    .file_name()
    .map(|n| n.to_os_string())
    .unwrap_or_default();
  name.push(".tmp");
  cache_file.with_file_name(name)
}

/// Derives the default cache key from the token list file
///
/// The key is the file name without its extension, so `mindfolk.txt` caches
/// into `mindfolk_cache.json`. Characters that are unsafe in file names are
/// replaced with `_`.
pub fn default_cache_key(token_file: &Path) -> String {
  let stem = token_file
    .file_stem()
    .and_then(|s| s.to_str())
    .filter(|s| !s.is_empty())
    .unwrap_or("tokens");

  stem
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
    .collect()
}

/// Creates a directory (and parents) if it does not exist yet
pub fn ensure_directory(dir: &Path) -> std::io::Result<()> {
  if dir.as_os_str().is_empty() || dir.exists() {
    return Ok(());
  }
  std::fs::create_dir_all(dir)
}
