//! Wire types for the ledger JSON-RPC responses

use serde::Deserialize;
use serde_json::Value;

/// Token account balance information from getTokenLargestAccounts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTokenAccountBalance {
    /// The token account address
    pub address: String,
    /// The token balance amount as a string
    pub amount: String,
    #[serde(default)]
    pub decimals: u8,
    /// The UI amount as a string
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}
