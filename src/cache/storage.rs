//! On-disk format of the request cache
//!
//! Current layout (schema version 1):
//!
//! ```json
//! {"version": 1, "tokens": {"<mint>": {"token": "<mint>", "holders": {...}, ...}}}
//! ```
//!
//! Files without a `version` field are the legacy flat `{token: record}` map
//! and are migrated on read. A file declaring a newer version is rejected so it
//! is never reinterpreted with the wrong schema.

use std::fs;
use std::path::Path;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{SnapshotError, SnapshotResult};
use crate::paths::get_cache_temp_path;
use crate::types::TokenMap;

/// Schema version written by this build
pub const CACHE_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct CacheDocumentRef<'a> {
    version: u32,
    tokens: &'a TokenMap,
}

#[derive(Deserialize)]
struct CacheDocument {
    version: u32,
    #[serde(default)]
    tokens: TokenMap,
}

/// Schema a cache file was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSchema {
    Legacy,
    Versioned(u32),
}

/// Serialize a map into the current versioned document
pub fn encode_document(tokens: &TokenMap) -> SnapshotResult<String> {
    let document = CacheDocumentRef {
        version: CACHE_SCHEMA_VERSION,
        tokens,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Top-level fields that tell a versioned document from a legacy map
#[derive(Deserialize)]
struct DocumentHeader {
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    tokens: Option<IgnoredAny>,
}

/// Parse a cache document, migrating legacy files
///
/// Both shapes are deserialized straight from the text so the token order of
/// the file is kept.
pub fn decode_document(contents: &str) -> SnapshotResult<(TokenMap, CacheSchema)> {
    let header: DocumentHeader = serde_json::from_str(contents)?;
    let is_versioned = header.version.as_ref().map(Value::is_u64).unwrap_or(false) && header.tokens.is_some();

    if !is_versioned {
        let tokens: TokenMap = serde_json::from_str(contents)?;
        return Ok((tokens, CacheSchema::Legacy));
    }

    let document: CacheDocument = serde_json::from_str(contents)?;
    if document.version > CACHE_SCHEMA_VERSION {
        return Err(SnapshotError::Decode(format!(
            "cache schema version {} is newer than supported version {}",
            document.version, CACHE_SCHEMA_VERSION
        )));
    }

    Ok((document.tokens, CacheSchema::Versioned(document.version)))
}

/// Write to a temporary sibling first, then rename over the target
pub fn write_atomic(path: &Path, contents: &str) -> SnapshotResult<()> {
    let temp_path = get_cache_temp_path(path);
    fs::write(&temp_path, contents)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_flat_map_is_migrated() {
        let legacy = r#"{
            "Mint1": {
                "token": "Mint1",
                "holders": {"info": {"owner": "Wallet1", "tokenAmount": {"amount": "1", "decimals": 0}}, "type": "account"},
                "arweave": {}
            },
            "Mint2": {"token": "Mint2"}
        }"#;

        let (tokens, schema) = decode_document(legacy).unwrap();
        assert_eq!(schema, CacheSchema::Legacy);
        assert_eq!(tokens.len(), 2);

        let first = tokens.get("Mint1").unwrap();
        assert_eq!(first.holder_address(), "Wallet1");
        assert!(first.arweave.as_ref().unwrap().is_empty());
        assert!(tokens.get("Mint2").unwrap().holders.is_none());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let future = r#"{"version": 99, "tokens": {}}"#;
        assert!(decode_document(future).is_err());
    }

    #[test]
    fn encoded_document_is_versioned() {
        let mut tokens = TokenMap::new();
        tokens.seed(["Mint1"]);
        let text = encode_document(&tokens).unwrap();

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["tokens"]["Mint1"]["token"], "Mint1");

        let (decoded, schema) = decode_document(&text).unwrap();
        assert_eq!(schema, CacheSchema::Versioned(1));
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn token_order_of_the_file_is_kept() {
        let mut tokens = TokenMap::new();
        tokens.seed(["MintB", "MintA", "MintC"]);
        let text = encode_document(&tokens).unwrap();

        let (decoded, _) = decode_document(&text).unwrap();
        assert_eq!(decoded.tokens().collect::<Vec<_>>(), vec!["MintB", "MintA", "MintC"]);

        let legacy = r#"{"MintZ": {"token": "MintZ"}, "MintY": {"token": "MintY"}}"#;
        let (decoded, schema) = decode_document(legacy).unwrap();
        assert_eq!(schema, CacheSchema::Legacy);
        assert_eq!(decoded.tokens().collect::<Vec<_>>(), vec!["MintZ", "MintY"]);
    }
}
