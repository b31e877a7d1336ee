//! Trait frequency across the collection

use std::collections::BTreeMap;

use crate::logger::{self, LogTag};
use crate::types::TokenMap;

/// `trait_type -> value -> count`, plus the number of tokens that had attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraitDistribution {
    pub tokens_with_metadata: usize,
    pub counts: BTreeMap<String, BTreeMap<String, usize>>,
}

impl TraitDistribution {
    /// Values of one trait ordered by ascending count, ties by value
    pub fn sorted_values(&self, trait_type: &str) -> Vec<(&str, usize)> {
        let mut values: Vec<(&str, usize)> = self
            .counts
            .get(trait_type)
            .map(|values| values.iter().map(|(v, c)| (v.as_str(), *c)).collect())
            .unwrap_or_default();
        values.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        values
    }
}

/// Count attribute values over every token with a non-empty attribute list
pub fn trait_distribution(tokens: &TokenMap) -> TraitDistribution {
    let mut distribution = TraitDistribution::default();

    for record in tokens.iter() {
        let Some(offchain) = record.arweave.as_ref().filter(|a| a.non_empty_attributes().is_some()) else {
            logger::debug(LogTag::Report, &format!("Token {} has no attributes", record.token));
            continue;
        };

        distribution.tokens_with_metadata += 1;
        for (trait_type, value) in offchain.distinct_traits() {
            *distribution
                .counts
                .entry(trait_type.to_string())
                .or_default()
                .entry(value.to_string())
                .or_insert(0) += 1;
        }
    }

    distribution
}
