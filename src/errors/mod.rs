/// Error handling for nftsnapshot
///
/// One error enum for the whole crate. Fetch failures are classified with
/// [`SnapshotError::is_recoverable`]; none of them abort a run, they only
/// decide whether a record field is left absent for the next run.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {service} (gave up after {attempts} retries)")]
    RateLimited { service: String, attempts: u32 },

    #[error("Timeout error: request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid pubkey '{value}': {reason}")]
    InvalidPubkey { value: String, reason: String },

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Token list error: {0}")]
    TokenList(String),

    #[error("Task failed: {0}")]
    Task(String),
}

impl SnapshotError {
    /// Transient failures that a later attempt may resolve
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SnapshotError::Rpc(_)
                | SnapshotError::Network(_)
                | SnapshotError::RateLimited { .. }
                | SnapshotError::Timeout { .. }
                | SnapshotError::AccountNotFound(_)
        ) || matches!(self, SnapshotError::Http { status, .. } if *status == 429 || *status >= 500)
    }

    /// Map a reqwest failure, keeping timeouts distinguishable
    pub fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SnapshotError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if let Some(status) = err.status() {
            SnapshotError::Http {
                url: endpoint.to_string(),
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            SnapshotError::Decode(format!("{}: {}", endpoint, err))
        } else {
            SnapshotError::Network(format!("{}: {}", endpoint, err))
        }
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
