//! Holder counts and ranking

use std::collections::HashMap;

use crate::types::TokenMap;

/// Known marketplace escrow wallets and their venue names
pub const MARKETPLACE_WALLETS: &[(&str, &str)] = &[
    ("GUfCR9mK6azb9vcpsxgXyj7XRPAKJd4KMHTTVvtncGgp", "MagicEden"),
    ("3D49QorJyNaL4rcpiynbuS3pRH4Y7EXEM6v6ZGaqfFGK", "Solanart"),
    ("4pUQS4Jo2dsfWzt3VgHXy3H6RYnEDd11oWPiaM2rdAPw", "AlphaArt"),
    ("F4ghBzHFNgJxV4wEQDchU5i7n4XWWMBSaq7CuswGiVsr", "DigitalEyes"),
];

pub fn marketplace_label(address: &str) -> Option<&'static str> {
    MARKETPLACE_WALLETS
        .iter()
        .find(|(wallet, _)| *wallet == address)
        .map(|(_, label)| *label)
}

/// Tokens held per wallet; unresolved holders count under the sentinel address
pub fn holder_counts(tokens: &TokenMap) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for record in tokens.iter() {
        *counts.entry(record.holder_address().to_string()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderRank {
    pub address: String,
    pub count: usize,
    pub label: Option<&'static str>,
}

/// Holders by descending count; ties by descending address
pub fn rank_holders(counts: &HashMap<String, usize>) -> Vec<HolderRank> {
    let mut ranked: Vec<HolderRank> = counts
        .iter()
        .map(|(address, count)| HolderRank {
            address: address.clone(),
            count: *count,
            label: marketplace_label(address),
        })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| b.address.cmp(&a.address)));
    ranked
}
