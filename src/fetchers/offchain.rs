use std::sync::Arc;

use async_trait::async_trait;

use super::{Fetcher, MetadataHttp};
use crate::config::HttpConfig;
use crate::errors::{SnapshotError, SnapshotResult};
use crate::logger::{self, LogTag};
use crate::rpc::ExponentialBackoff;
use crate::types::{OffChainMetadata, TokenField, TokenRecord};

/// Downloads the JSON document referenced by the metadata URI
///
/// Runs only once the on-chain account is known. Outcomes:
/// - no URI, a non-200/non-429 status or an unparsable body: `{}` (terminal)
/// - 429: retried with exponential backoff; once retries run out the field
///   stays absent for a later run
/// - transport failure: error, field stays absent
pub struct OffChainFetcher {
    http: Arc<dyn MetadataHttp>,
    backoff: ExponentialBackoff,
}

impl OffChainFetcher {
    pub fn new(http: Arc<dyn MetadataHttp>, backoff: ExponentialBackoff) -> Self {
        Self { http, backoff }
    }

    pub fn from_config(http: Arc<dyn MetadataHttp>, config: &HttpConfig) -> Self {
        Self::new(
            http,
            ExponentialBackoff::new(
                config.retry_base_delay(),
                config.retry_max_delay(),
                config.max_retries,
            ),
        )
    }

    async fn download(&self, token: &str, uri: &str) -> SnapshotResult<OffChainMetadata> {
        let mut retry = 0;
        loop {
            let response = self.http.get(uri).await?;

            match response.status {
                200 => {
                    return Ok(serde_json::from_str(&response.body).unwrap_or_else(|e| {
                        logger::error(
                            LogTag::OffChain,
                            &format!("{}: invalid metadata JSON at {}: {}", token, uri, e),
                        );
                        OffChainMetadata::unavailable()
                    }));
                }
                429 => match self.backoff.delay_for(retry) {
                    Some(delay) => {
                        logger::warning(
                            LogTag::OffChain,
                            &format!(
                                "Rate limited by {}, retrying in {}ms (retry {}/{})",
                                uri,
                                delay.as_millis(),
                                retry + 1,
                                self.backoff.max_retries()
                            ),
                        );
                        tokio::time::sleep(delay).await;
                        retry += 1;
                    }
                    None => {
                        return Err(SnapshotError::RateLimited {
                            service: uri.to_string(),
                            attempts: retry,
                        });
                    }
                },
                status => {
                    logger::error(
                        LogTag::OffChain,
                        &format!("{}: HTTP {} from {}", token, status, uri),
                    );
                    return Ok(OffChainMetadata::unavailable());
                }
            }
        }
    }
}

#[async_trait]
impl Fetcher for OffChainFetcher {
    fn field(&self) -> TokenField {
        TokenField::OffChain
    }

    fn wants(&self, record: &TokenRecord) -> bool {
        record.account.is_some() && record.arweave.is_none()
    }

    async fn fetch(&self, mut record: TokenRecord) -> SnapshotResult<TokenRecord> {
        let metadata = match record.metadata_uri() {
            Some(uri) => {
                let uri = uri.to_string();
                self.download(&record.token, &uri).await?
            }
            None => {
                logger::debug(LogTag::OffChain, &format!("{}: no metadata URI", record.token));
                OffChainMetadata::unavailable()
            }
        };

        record.arweave = Some(metadata);
        Ok(record)
    }
}
