//! Ledger methods used by the fetchers

use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

use super::RpcClient;
use crate::errors::{SnapshotError, SnapshotResult};
use crate::rpc::types::RpcTokenAccountBalance;

/// Ledger lookups needed to enrich a token
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Largest token accounts for a mint, largest first
    async fn get_token_largest_accounts(&self, mint: &Pubkey) -> SnapshotResult<Vec<RpcTokenAccountBalance>>;

    /// `data.parsed` of an account fetched with `jsonParsed` encoding
    ///
    /// `Ok(None)` when the account does not exist; `Value::Null` when it exists
    /// but the node could not parse it.
    async fn get_parsed_account(&self, address: &Pubkey) -> SnapshotResult<Option<Value>>;

    /// Raw account data, `Ok(None)` when the account does not exist
    async fn get_account_data(&self, address: &Pubkey) -> SnapshotResult<Option<Vec<u8>>>;
}

#[async_trait]
impl LedgerRpc for RpcClient {
    async fn get_token_largest_accounts(&self, mint: &Pubkey) -> SnapshotResult<Vec<RpcTokenAccountBalance>> {
        let params = serde_json::json!([
            mint.to_string(),
            { "commitment": "confirmed" }
        ]);

        let result = self.execute_raw("getTokenLargestAccounts", params).await?;

        let values = result
            .get("value")
            .cloned()
            .ok_or_else(|| SnapshotError::Decode("getTokenLargestAccounts: missing value array".to_string()))?;

        serde_json::from_value(values)
            .map_err(|e| SnapshotError::Decode(format!("getTokenLargestAccounts: {}", e)))
    }

    async fn get_parsed_account(&self, address: &Pubkey) -> SnapshotResult<Option<Value>> {
        let params = serde_json::json!([
            address.to_string(),
            { "encoding": "jsonParsed", "commitment": "confirmed" }
        ]);

        let result = self.execute_raw("getAccountInfo", params).await?;

        match result.get("value") {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(
                value
                    .get("data")
                    .and_then(|d| d.get("parsed"))
                    .cloned()
                    .unwrap_or(Value::Null),
            )),
        }
    }

    async fn get_account_data(&self, address: &Pubkey) -> SnapshotResult<Option<Vec<u8>>> {
        let params = serde_json::json!([
            address.to_string(),
            { "encoding": "base64", "commitment": "confirmed" }
        ]);

        let result = self.execute_raw("getAccountInfo", params).await?;

        let value = match result.get("value") {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        // data is ["<base64>", "base64"]
        let encoded = value
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|d| d.as_str())
            .ok_or_else(|| SnapshotError::Decode(format!("getAccountInfo {}: missing data", address)))?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map(Some)
            .map_err(|e| SnapshotError::Decode(format!("getAccountInfo {}: {}", address, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RpcConfig;
    use serde_json::json;
    use std::str::FromStr;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MINT: &str = "9ARngHhVaCtH5JFieRdSS5Y8cdZk2TMF4tfGSWFB9iSK";
    const ACCOUNT: &str = "Bp5NV4Jd7eGFFXsD7quTrQHn2EWtr4kfJ1iWdUr2dFe9";

    fn client_for(server: &MockServer) -> RpcClient {
        let config = RpcConfig {
            url: server.uri(),
            timeout_secs: 5,
            ..Default::default()
        };
        RpcClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn largest_accounts_are_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getTokenLargestAccounts"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "context": {"slot": 1},
                    "value": [{"address": ACCOUNT, "amount": "1", "decimals": 0, "uiAmount": 1.0, "uiAmountString": "1"}]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mint = Pubkey::from_str(MINT).unwrap();
        let accounts = client.get_token_largest_accounts(&mint).await.unwrap();

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].address, ACCOUNT);
        assert_eq!(accounts[0].amount, "1");
        assert_eq!(client.limiter().acquired(), 1);
    }

    #[tokio::test]
    async fn undecodable_largest_accounts_are_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getTokenLargestAccounts"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"context": {"slot": 1}, "value": [{"address": ACCOUNT, "decimals": 0}]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .get_token_largest_accounts(&Pubkey::from_str(MINT).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn account_data_is_base64_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getAccountInfo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"context": {"slot": 1}, "value": {"data": ["AQID", "base64"], "owner": MINT, "lamports": 1}}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let data = client
            .get_account_data(&Pubkey::from_str(ACCOUNT).unwrap())
            .await
            .unwrap();
        assert_eq!(data, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn missing_account_and_rpc_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getAccountInfo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": {"context": {"slot": 1}, "value": null}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getTokenLargestAccounts"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "Invalid param"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let key = Pubkey::from_str(ACCOUNT).unwrap();
        assert_eq!(client.get_parsed_account(&key).await.unwrap(), None);

        let err = client.get_token_largest_accounts(&key).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Rpc(_)));
    }

    #[tokio::test]
    async fn http_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .get_parsed_account(&Pubkey::from_str(ACCOUNT).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Http { status: 429, .. }));
        assert!(err.is_recoverable());
    }
}
