//! Configuration schema
//!
//! One section per component. Every field has a default so an absent or
//! partial `nftsnapshot.toml` is always valid.

use std::time::Duration;

use crate::config_struct;

config_struct! {
    /// Ledger JSON-RPC endpoint
    pub struct RpcConfig {
        url: String = "https://ssc-dao.genesysgo.net/".to_string(),
        /// Per-request connection + response timeout
        timeout_secs: u64 = 60,
        /// Requests allowed per window against the RPC node
        requests_per_window: u32 = 100,
        window_ms: u64 = 1000,
    }
}

config_struct! {
    /// Off-chain metadata HTTP fetching
    pub struct HttpConfig {
        timeout_secs: u64 = 60,
        requests_per_window: u32 = 100,
        window_ms: u64 = 1000,
        /// Idle connections kept per host
        max_connections: usize = 100,
        /// First delay after an HTTP 429
        retry_base_delay_ms: u64 = 3000,
        retry_max_delay_ms: u64 = 30000,
        /// Retries after HTTP 429 before the record is left for a later run
        max_retries: u32 = 8,
        user_agent: String = concat!("nftsnapshot/", env!("CARGO_PKG_VERSION")).to_string(),
    }
}

config_struct! {
    /// Request cache location
    pub struct CacheConfig {
        directory: String = "cache".to_string(),
        /// Drop cached tokens that are not in the current token list
        prune_stale: bool = false,
    }
}

config_struct! {
    /// Enrichment orchestration
    pub struct EnrichConfig {
        /// Fetch tasks awaited at once within a phase
        max_in_flight: usize = 100,
        show_progress: bool = true,
    }
}

config_struct! {
    /// Logging output
    pub struct LoggingConfig {
        /// Log file path; empty disables file logging
        file: String = "app.log".to_string(),
        min_level: String = "info".to_string(),
        debug_tags: Vec<String> = Vec::new(),
    }
}

config_struct! {
    /// Root configuration, constructed once at startup and passed explicitly
    pub struct SnapshotConfig {
        rpc: RpcConfig = RpcConfig::default(),
        http: HttpConfig = HttpConfig::default(),
        cache: CacheConfig = CacheConfig::default(),
        enrich: EnrichConfig = EnrichConfig::default(),
        logging: LoggingConfig = LoggingConfig::default(),
    }
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}
