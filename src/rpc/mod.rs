//! Ledger RPC access and request pacing

pub mod client;
pub mod rate_limiter;
pub mod types;

pub use client::{LedgerRpc, RpcClient};
pub use rate_limiter::{ExponentialBackoff, RequestRateLimiter};
pub use types::RpcTokenAccountBalance;
