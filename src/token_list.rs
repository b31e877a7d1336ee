//! Token list input
//!
//! One token identifier per line. Surrounding whitespace and blank lines are
//! ignored; repeated identifiers keep their first position.

use std::collections::HashSet;
use std::path::Path;

use crate::errors::{SnapshotError, SnapshotResult};

pub fn parse_token_list(contents: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect()
}

/// Read the token list; failing to read it is the one fatal condition of a run
pub fn read_token_list(path: &Path) -> SnapshotResult<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| SnapshotError::TokenList(format!("Unable to read {}: {}", path.display(), e)))?;
    Ok(parse_token_list(&contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_skips_blanks_and_dedupes() {
        let tokens = parse_token_list("  MintA \n\nMintB\r\nMintA\n   \nMintC");
        assert_eq!(tokens, vec!["MintA", "MintB", "MintC"]);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_token_list(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, SnapshotError::TokenList(_)));

        let path = dir.path().join("tokens.txt");
        std::fs::write(&path, "MintA\nMintB\n").unwrap();
        assert_eq!(read_token_list(&path).unwrap(), vec!["MintA", "MintB"]);
    }
}
