//! Aggregations over an enriched token map

mod holders;
mod rarity;
mod traits;

pub use holders::{holder_counts, marketplace_label, rank_holders, HolderRank, MARKETPLACE_WALLETS};
pub use rarity::{summarize, token_number, RarityTable, TokenSummary};
pub use traits::{trait_distribution, TraitDistribution};
