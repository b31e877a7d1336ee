use std::sync::Arc;

use async_trait::async_trait;

use super::Fetcher;
use crate::errors::{SnapshotError, SnapshotResult};
use crate::logger::{self, LogTag};
use crate::metadata::parse_pubkey;
use crate::rpc::LedgerRpc;
use crate::types::{HolderInfo, TokenField, TokenRecord};

/// Resolves the wallet holding a mint through its largest token account
pub struct HolderFetcher {
    rpc: Arc<dyn LedgerRpc>,
}

impl HolderFetcher {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { rpc }
    }

    async fn lookup(&self, token: &str) -> SnapshotResult<HolderInfo> {
        let mint = parse_pubkey(token)?;

        let largest = match self.rpc.get_token_largest_accounts(&mint).await {
            Ok(largest) => largest,
            Err(SnapshotError::Decode(reason)) => {
                logger::debug(LogTag::Holders, &format!("{}: malformed largest accounts: {}", token, reason));
                return Ok(HolderInfo::unknown(None));
            }
            Err(e) => return Err(e),
        };
        let Some(top) = largest.into_iter().next() else {
            logger::debug(LogTag::Holders, &format!("{}: no token accounts", token));
            return Ok(HolderInfo::unknown(None));
        };

        let account = match parse_pubkey(&top.address) {
            Ok(account) => account,
            Err(e) => {
                logger::debug(LogTag::Holders, &format!("{}: largest account unusable: {}", token, e));
                return Ok(HolderInfo::unknown(None));
            }
        };
        let holder = match self.rpc.get_parsed_account(&account).await? {
            Some(parsed) => HolderInfo::from_parsed_account(&parsed, Some(top.address.clone())),
            None => HolderInfo::unknown(Some(top.address.clone())),
        };

        if holder.is_unknown() {
            logger::debug(
                LogTag::Holders,
                &format!("{}: owner of {} could not be resolved", token, top.address),
            );
        }

        Ok(holder)
    }
}

#[async_trait]
impl Fetcher for HolderFetcher {
    fn field(&self) -> TokenField {
        TokenField::Holders
    }

    async fn fetch(&self, mut record: TokenRecord) -> SnapshotResult<TokenRecord> {
        let holder = self.lookup(&record.token).await?;
        logger::verbose(
            LogTag::Holders,
            &format!("{} held by {} ({})", record.token, holder.owner, holder.amount),
        );
        record.holders = Some(holder);
        Ok(record)
    }
}
