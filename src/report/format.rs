//! Console report text

use std::collections::HashMap;
use std::fmt::Write;

use crate::analytics::{rank_holders, RarityTable, TokenSummary, TraitDistribution};

/// Totals followed by every holder, biggest first, marketplace wallets labeled
pub fn format_biggest_holders(total_tokens: usize, counts: &HashMap<String, usize>) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "Total tokens: {}", total_tokens);
    let _ = writeln!(out, "Total Holder Wallets: {}", counts.len());
    let _ = writeln!(out);
    let _ = writeln!(out, "Biggest holders:");
    let _ = writeln!(out, "----------");

    for holder in rank_holders(counts) {
        let suffix = holder
            .label
            .map(|label| format!(" ({})", label))
            .unwrap_or_default();
        let _ = writeln!(out, "{}: {}{}", holder.address, holder.count, suffix);
    }
    out
}

/// Value counts per trait type with their share of tokens that had metadata
pub fn format_trait_frequency(distribution: &TraitDistribution) -> String {
    let total = distribution.tokens_with_metadata;
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{} tokens with metadata", total);
    let _ = writeln!(out);
    let _ = writeln!(out, "Attributes:");
    let _ = writeln!(out, "----------");

    for trait_type in distribution.counts.keys() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", trait_type);
        for (value, count) in distribution.sorted_values(trait_type) {
            let _ = writeln!(out, "{}: {}{}", value, count, frequency_suffix(count, total));
        }
    }
    out
}

/// Rank, score and trait breakdown of one token; `None` if the token is unknown
pub fn format_token_rarity(token: &str, tokens: &[TokenSummary], table: &RarityTable) -> Option<String> {
    let summary = tokens.iter().find(|t| t.token == token)?;
    let rank = table.rank(token)?;
    let score = table.score(token)?;

    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "Token {}", token);
    let _ = writeln!(out, "----------");
    let _ = writeln!(out, "Rank: {}", rank);
    let _ = writeln!(out, "Rarity: {:.20}", score);
    let _ = writeln!(out);
    let _ = writeln!(out, "Traits");
    let _ = writeln!(out, "-----");

    for trait_type in table.trait_order() {
        let value = summary.trait_value(trait_type);
        let count = table.count(trait_type, value);
        let _ = writeln!(
            out,
            "{}: {}{}",
            trait_type,
            value,
            frequency_suffix(count, table.total())
        );
    }
    Some(out)
}

fn frequency_suffix(count: usize, total: usize) -> String {
    let frequency = if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    };
    format!(" ({}/{}, {:.6})", count, total, frequency)
}
