//! Plain HTTP access to off-chain metadata hosts

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::HttpConfig;
use crate::errors::{SnapshotError, SnapshotResult};
use crate::logger::{self, LogTag};
use crate::rpc::RequestRateLimiter;

/// Status and body of one GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait MetadataHttp: Send + Sync {
    /// GET `uri`; any status is a successful response, only transport failures error
    async fn get(&self, uri: &str) -> SnapshotResult<HttpResponse>;
}

/// reqwest-backed client sharing one rate limiter across all requests
pub struct ReqwestMetadataHttp {
    client: reqwest::Client,
    limiter: Arc<RequestRateLimiter>,
}

impl ReqwestMetadataHttp {
    pub fn new(config: &HttpConfig) -> SnapshotResult<Self> {
        let limiter = Arc::new(RequestRateLimiter::new(
            "offchain-http",
            config.requests_per_window,
            config.window(),
        ));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .pool_max_idle_per_host(config.max_connections)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SnapshotError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, limiter })
    }

    pub fn limiter(&self) -> &Arc<RequestRateLimiter> {
        &self.limiter
    }
}

#[async_trait]
impl MetadataHttp for ReqwestMetadataHttp {
    async fn get(&self, uri: &str) -> SnapshotResult<HttpResponse> {
        self.limiter.acquire().await;
        logger::debug(LogTag::OffChain, &format!("GET {}", uri));

        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| SnapshotError::from_reqwest(uri, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SnapshotError::from_reqwest(uri, e))?;

        Ok(HttpResponse { status, body })
    }
}
