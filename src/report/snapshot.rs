//! CSV ownership snapshot

use std::path::Path;

use csv::WriterBuilder;

use crate::analytics::{RarityTable, TokenSummary};
use crate::errors::SnapshotResult;

const FIXED_COLUMNS: [&str; 8] = [
    "Number",
    "TokenName",
    "Token",
    "HolderAddress",
    "TotalHeld",
    "Image",
    "Rank",
    "Rarity",
];

/// Header row: fixed columns, then trait types in first-seen order
pub fn snapshot_headers(table: &RarityTable) -> Vec<String> {
    FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(table.trait_order().iter().cloned())
        .collect()
}

/// One row per token, in the given order
pub fn snapshot_rows(tokens: &[TokenSummary], table: &RarityTable) -> Vec<Vec<String>> {
    tokens
        .iter()
        .map(|token| {
            let rank = table.rank(&token.token).map(|r| r.to_string()).unwrap_or_default();
            let rarity = table
                .score(&token.token)
                .map(|s| format!("{:.20}%", s * 100.0))
                .unwrap_or_default();

            let mut row = vec![
                token.number.clone(),
                token.name.clone(),
                token.token.clone(),
                token.holder_address.clone(),
                token.amount.clone(),
                token.image.clone(),
                rank,
                rarity,
            ];
            row.extend(
                table
                    .trait_order()
                    .iter()
                    .map(|t| token.trait_value(t).to_string()),
            );
            row
        })
        .collect()
}

/// Write the snapshot CSV, replacing any existing file
pub fn write_snapshot(path: &Path, tokens: &[TokenSummary], table: &RarityTable) -> SnapshotResult<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(snapshot_headers(table))?;
    for row in snapshot_rows(tokens, table) {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
