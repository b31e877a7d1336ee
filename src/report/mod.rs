//! Console reports and the CSV snapshot

mod format;
mod snapshot;

pub use format::{format_biggest_holders, format_token_rarity, format_trait_frequency};
pub use snapshot::{snapshot_headers, snapshot_rows, write_snapshot};
