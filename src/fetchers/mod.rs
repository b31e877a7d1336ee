//! Per-token remote lookups
//!
//! Each fetcher fills exactly one [`TokenField`] of a record. The enricher
//! hands a fetcher a copy of the record and merges only that field back, so a
//! fetcher never has to care about the rest of the map.

mod account;
mod holders;
mod http;
mod offchain;

pub use account::AccountFetcher;
pub use holders::HolderFetcher;
pub use http::{HttpResponse, MetadataHttp, ReqwestMetadataHttp};
pub use offchain::OffChainFetcher;

use async_trait::async_trait;

use crate::errors::SnapshotResult;
use crate::types::{TokenField, TokenRecord};

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Field this fetcher populates
    fn field(&self) -> TokenField;

    /// Whether the record still needs this fetcher
    ///
    /// A field is fetched if and only if it is absent.
    fn wants(&self, record: &TokenRecord) -> bool {
        !self.field().is_present(record)
    }

    /// Fetch and return the record with this fetcher's field populated
    ///
    /// An `Err` leaves the field absent so a later run retries it.
    async fn fetch(&self, record: TokenRecord) -> SnapshotResult<TokenRecord>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory doubles for the remote services

    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;
    use solana_sdk::pubkey::Pubkey;

    use super::{HttpResponse, MetadataHttp};
    use crate::errors::{SnapshotError, SnapshotResult};
    use crate::rpc::{LedgerRpc, RpcTokenAccountBalance};

    #[derive(Default)]
    pub struct FakeLedger {
        pub largest: HashMap<String, Vec<RpcTokenAccountBalance>>,
        pub parsed: HashMap<String, Value>,
        pub raw: HashMap<String, Vec<u8>>,
        /// Mints whose lookups fail with a transport error
        pub failing: Vec<String>,
        /// Mints whose lookups panic
        pub panicking: Vec<String>,
        /// Mints whose largest-accounts reply does not decode
        pub malformed: Vec<String>,
        pub calls: AtomicUsize,
    }

    impl FakeLedger {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn with_holder(mut self, mint: &Pubkey, account: &Pubkey, owner: &str) -> Self {
            self.largest.insert(
                mint.to_string(),
                vec![RpcTokenAccountBalance {
                    address: account.to_string(),
                    amount: "1".to_string(),
                    decimals: 0,
                    ui_amount_string: Some("1".to_string()),
                }],
            );
            self.parsed.insert(
                account.to_string(),
                serde_json::json!({
                    "info": {"owner": owner, "tokenAmount": {"amount": "1", "decimals": 0}},
                    "type": "account"
                }),
            );
            self
        }
    }

    #[async_trait]
    impl LedgerRpc for FakeLedger {
        async fn get_token_largest_accounts(
            &self,
            mint: &Pubkey,
        ) -> SnapshotResult<Vec<RpcTokenAccountBalance>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = mint.to_string();
            if self.panicking.contains(&key) {
                panic!("ledger exploded for {}", key);
            }
            if self.failing.contains(&key) {
                return Err(SnapshotError::Timeout { endpoint: "fake".to_string() });
            }
            if self.malformed.contains(&key) {
                return Err(SnapshotError::Decode("getTokenLargestAccounts: missing field `amount`".to_string()));
            }
            Ok(self.largest.get(&key).cloned().unwrap_or_default())
        }

        async fn get_parsed_account(&self, address: &Pubkey) -> SnapshotResult<Option<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.parsed.get(&address.to_string()).cloned())
        }

        async fn get_account_data(&self, address: &Pubkey) -> SnapshotResult<Option<Vec<u8>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.raw.get(&address.to_string()).cloned())
        }
    }

    /// Scripted HTTP responses per URI, served in order; the last one repeats
    #[derive(Default)]
    pub struct FakeHttp {
        pub responses: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
        pub calls: AtomicUsize,
    }

    impl FakeHttp {
        pub fn respond(self, uri: &str, status: u16, body: &str) -> Self {
            if let Ok(mut responses) = self.responses.lock() {
                responses
                    .entry(uri.to_string())
                    .or_default()
                    .push_back(HttpResponse {
                        status,
                        body: body.to_string(),
                    });
            }
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetadataHttp for FakeHttp {
        async fn get(&self, uri: &str) -> SnapshotResult<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            let queue = responses
                .get_mut(uri)
                .ok_or_else(|| SnapshotError::Network(format!("no route to {}", uri)))?;
            let response = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            response.ok_or_else(|| SnapshotError::Network(format!("no response for {}", uri)))
        }
    }
}
