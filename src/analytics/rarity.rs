//! Per-token rarity
//!
//! A token's score is the product, over every trait type seen anywhere in
//! the collection, of the share of tokens carrying the same value for that
//! trait. A token lacking a trait carries the empty value. Lower scores are
//! rarer; rank 1 is the rarest token.

use std::collections::HashMap;

use crate::types::{TokenMap, TokenRecord};

/// Flattened view of a token used for ranking and reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSummary {
    pub token: String,
    pub holder_address: String,
    pub amount: String,
    pub name: String,
    /// Name part after `#`, e.g. `42` for `Mindfolk #42`
    pub number: String,
    pub image: String,
    /// `(trait_type, value)` in document order
    pub traits: Vec<(String, String)>,
}

impl TokenSummary {
    pub fn new(token: &str, traits: &[(&str, &str)]) -> Self {
        Self {
            token: token.to_string(),
            holder_address: String::new(),
            amount: String::new(),
            name: String::new(),
            number: String::new(),
            image: String::new(),
            traits: traits
                .iter()
                .map(|(t, v)| (t.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn from_record(record: &TokenRecord) -> Self {
        let name = record.name().unwrap_or_default().to_string();
        let offchain = record.arweave.as_ref();

        let traits: Vec<(String, String)> = offchain
            .map(|a| a.distinct_traits())
            .unwrap_or_default()
            .into_iter()
            .map(|(t, v)| (t.to_string(), v.to_string()))
            .collect();

        Self {
            token: record.token.clone(),
            holder_address: record.holder_address().to_string(),
            amount: record
                .holders
                .as_ref()
                .map(|h| h.amount.clone())
                .unwrap_or_default(),
            number: token_number(&name).to_string(),
            name,
            image: offchain.and_then(|a| a.image.clone()).unwrap_or_default(),
            traits,
        }
    }

    /// Value of a trait, empty when the token lacks it
    pub fn trait_value(&self, trait_type: &str) -> &str {
        self.traits
            .iter()
            .find(|(t, _)| t == trait_type)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }
}

/// Text after the first `#`, or the whole name when there is none
pub fn token_number(name: &str) -> &str {
    match name.find('#') {
        Some(index) => &name[index + 1..],
        None => name,
    }
}

pub fn summarize(tokens: &TokenMap) -> Vec<TokenSummary> {
    tokens.iter().map(TokenSummary::from_record).collect()
}

/// Trait frequencies, scores and ranks for a set of tokens
#[derive(Debug, Clone)]
pub struct RarityTable {
    total: usize,
    trait_order: Vec<String>,
    counts: HashMap<String, HashMap<String, usize>>,
    scores: HashMap<String, f64>,
    ranks: HashMap<String, usize>,
}

impl RarityTable {
    pub fn build(tokens: &[TokenSummary]) -> Self {
        let total = tokens.len();
        let trait_order = trait_order(tokens);

        let mut counts: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for token in tokens {
            for trait_type in &trait_order {
                *counts
                    .entry(trait_type.clone())
                    .or_default()
                    .entry(token.trait_value(trait_type).to_string())
                    .or_insert(0) += 1;
            }
        }

        let mut table = Self {
            total,
            trait_order,
            counts,
            scores: HashMap::new(),
            ranks: HashMap::new(),
        };

        let mut scored: Vec<(&str, f64)> = tokens
            .iter()
            .map(|token| {
                let score = table
                    .trait_order
                    .iter()
                    .fold(1.0, |acc, trait_type| acc * table.frequency(trait_type, token.trait_value(trait_type)));
                (token.token.as_str(), score)
            })
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        for (index, (token, score)) in scored.into_iter().enumerate() {
            table.scores.insert(token.to_string(), score);
            table.ranks.insert(token.to_string(), index + 1);
        }

        table
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Trait types in first-seen order
    pub fn trait_order(&self) -> &[String] {
        &self.trait_order
    }

    /// Trait type -> column index
    pub fn trait_map(&self) -> HashMap<String, usize> {
        self.trait_order
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect()
    }

    pub fn count(&self, trait_type: &str, value: &str) -> usize {
        self.counts
            .get(trait_type)
            .and_then(|values| values.get(value))
            .copied()
            .unwrap_or(0)
    }

    pub fn frequency(&self, trait_type: &str, value: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(trait_type, value) as f64 / self.total as f64
    }

    pub fn score(&self, token: &str) -> Option<f64> {
        self.scores.get(token).copied()
    }

    pub fn rank(&self, token: &str) -> Option<usize> {
        self.ranks.get(token).copied()
    }
}

fn trait_order(tokens: &[TokenSummary]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for token in tokens {
        for (trait_type, _) in &token.traits {
            if !order.contains(trait_type) {
                order.push(trait_type.clone());
            }
        }
    }
    order
}
