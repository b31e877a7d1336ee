//! Ledger JSON-RPC client
//!
//! A thin reqwest wrapper: every call goes through [`RpcClient::execute_raw`],
//! which waits on the shared rate limiter right before the POST.

mod methods;

pub use methods::LedgerRpc;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::config::RpcConfig;
use crate::errors::{SnapshotError, SnapshotResult};
use crate::logger::{self, LogTag};
use crate::rpc::rate_limiter::RequestRateLimiter;
use crate::rpc::types::RpcResponse;

pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    limiter: Arc<RequestRateLimiter>,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Build a client with its own limiter from the RPC section
    pub fn new(config: &RpcConfig) -> SnapshotResult<Self> {
        let limiter = Arc::new(RequestRateLimiter::new(
            "ledger-rpc",
            config.requests_per_window,
            config.window(),
        ));
        Self::with_limiter(config, limiter)
    }

    pub fn with_limiter(config: &RpcConfig, limiter: Arc<RequestRateLimiter>) -> SnapshotResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| SnapshotError::Config(format!("Failed to create RPC HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: config.url.clone(),
            limiter,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn limiter(&self) -> &Arc<RequestRateLimiter> {
        &self.limiter
    }

    /// Issue one JSON-RPC call and return its `result`
    pub async fn execute_raw(&self, method: &str, params: Value) -> SnapshotResult<Value> {
        self.limiter.acquire().await;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        logger::debug(LogTag::Rpc, &format!("{} #{} -> {}", method, id, self.url));

        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| SnapshotError::from_reqwest(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnapshotError::Http {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| SnapshotError::from_reqwest(&self.url, e))?;

        if let Some(error) = body.error {
            return Err(SnapshotError::Rpc(format!(
                "{} failed ({}): {}",
                method, error.code, error.message
            )));
        }

        body.result
            .ok_or_else(|| SnapshotError::Rpc(format!("{} returned no result", method)))
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.url)
            .field("limiter", &self.limiter)
            .finish()
    }
}
