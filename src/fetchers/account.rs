use std::sync::Arc;

use async_trait::async_trait;

use super::Fetcher;
use crate::errors::{SnapshotError, SnapshotResult};
use crate::logger::{self, LogTag};
use crate::metadata::{decode_metadata, derive_metadata_pda, parse_pubkey};
use crate::rpc::LedgerRpc;
use crate::types::{TokenField, TokenRecord};

/// Reads and decodes the on-chain Metaplex metadata account of a mint
pub struct AccountFetcher {
    rpc: Arc<dyn LedgerRpc>,
}

impl AccountFetcher {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl Fetcher for AccountFetcher {
    fn field(&self) -> TokenField {
        TokenField::Account
    }

    async fn fetch(&self, mut record: TokenRecord) -> SnapshotResult<TokenRecord> {
        let mint = parse_pubkey(&record.token)?;
        let pda = derive_metadata_pda(&mint)?;

        let data = self
            .rpc
            .get_account_data(&pda)
            .await?
            .ok_or_else(|| SnapshotError::AccountNotFound(format!("metadata {} for {}", pda, record.token)))?;

        let account = decode_metadata(&data)?;
        logger::verbose(
            LogTag::Metadata,
            &format!(
                "{} -> '{}' uri={}",
                record.token,
                account.data.name,
                account.data.uri.as_deref().unwrap_or("-")
            ),
        );

        record.account = Some(account);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::testing::FakeLedger;
    use crate::metadata::tests::encode_metadata;
    use solana_sdk::pubkey::Pubkey;

    #[tokio::test]
    async fn decodes_account_at_derived_address() {
        let mint = Pubkey::new_unique();
        let pda = derive_metadata_pda(&mint).unwrap();
        let mut ledger = FakeLedger::default();
        ledger.raw.insert(
            pda.to_string(),
            encode_metadata(&mint, "Mindfolk #7", "https://arweave.net/7"),
        );
        let fetcher = AccountFetcher::new(Arc::new(ledger));

        let record = fetcher.fetch(TokenRecord::new(&mint.to_string())).await.unwrap();
        assert_eq!(record.name(), Some("Mindfolk #7"));
        assert_eq!(record.metadata_uri(), Some("https://arweave.net/7"));
        assert!(record.arweave.is_none());
    }

    #[tokio::test]
    async fn missing_account_leaves_field_absent() {
        let fetcher = AccountFetcher::new(Arc::new(FakeLedger::default()));
        let err = fetcher
            .fetch(TokenRecord::new(&Pubkey::new_unique().to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::AccountNotFound(_)));
    }
}
