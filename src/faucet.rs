//! Testnet Faucet Client
//!
//! Tempo nodes expose a `tempo_fundAddress` JSON-RPC method on testnet that
//! credits an address with test stablecoins.

use crate::types::describe_error;
use crate::utils::checksum;
use ethers::types::Address;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const FUND_METHOD: &str = "tempo_fundAddress";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FaucetError {
    /// The node answered with a JSON-RPC error object
    #[error("{}", rpc_message(.0))]
    Rpc(Option<String>),

    #[error("{0}")]
    Transport(String),

    #[error("invalid faucet response: {0}")]
    Decode(String),
}

fn rpc_message(message: &Option<String>) -> &str {
    message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or("Faucet error")
}

impl FaucetError {
    /// Message shown to the user, e.g. `Faucet failed: busy`
    pub fn user_message(&self) -> String {
        format!(
            "Faucet failed: {}",
            describe_error(None, Some(&self.to_string()), "Unknown error")
        )
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<String>,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorBody>,
}

#[derive(Deserialize)]
struct JsonRpcErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FaucetClient {
    client: Client,
    url: String,
}

impl FaucetClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask the faucet to credit `address`. Returns the raw `result` value.
    pub async fn fund_address(&self, address: Address) -> Result<serde_json::Value, FaucetError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: FUND_METHOD,
            params: vec![checksum(&address)],
            id: 1,
        };
        info!("Requesting testnet funds for {:#x}", address);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FaucetError::Transport(e.to_string()))?;

        let status = response.status();
        let body: JsonRpcResponse = response.json().await.map_err(|e| {
            warn!("Faucet returned undecodable body (HTTP {}): {}", status, e);
            FaucetError::Decode(e.to_string())
        })?;

        if let Some(error) = body.error {
            warn!("Faucet rejected request: {:?}", error.message);
            return Err(FaucetError::Rpc(error.message));
        }

        let result = body.result.unwrap_or(serde_json::Value::Null);
        debug!("Faucet result: {}", result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn address() -> Address {
        "0x000000000000000000000000000000000000dEaD".parse().unwrap()
    }

    #[tokio::test]
    async fn test_fund_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "jsonrpc": "2.0",
                "method": "tempo_fundAddress",
                "params": ["0x000000000000000000000000000000000000dEaD"],
                "id": 1
            })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":["0x01"]}"#)
            .create_async()
            .await;

        let faucet = FaucetClient::new(server.url());
        let result = faucet.fund_address(address()).await.unwrap();
        assert_eq!(result, json!(["0x01"]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fund_rpc_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"busy"}}"#)
            .create_async()
            .await;

        let faucet = FaucetClient::new(server.url());
        let err = faucet.fund_address(address()).await.unwrap_err();
        assert_eq!(err, FaucetError::Rpc(Some("busy".to_string())));
        assert_eq!(err.user_message(), "Faucet failed: busy");
    }

    #[tokio::test]
    async fn test_fund_error_without_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000}}"#)
            .create_async()
            .await;

        let faucet = FaucetClient::new(server.url());
        let err = faucet.fund_address(address()).await.unwrap_err();
        assert_eq!(err.user_message(), "Faucet failed: Faucet error");
    }

    #[tokio::test]
    async fn test_fund_undecodable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let faucet = FaucetClient::new(server.url());
        let err = faucet.fund_address(address()).await.unwrap_err();
        assert!(matches!(err, FaucetError::Decode(_)));
        assert!(err.user_message().starts_with("Faucet failed: invalid faucet response"));
    }

    #[test]
    fn test_user_message_fallbacks() {
        assert_eq!(
            FaucetError::Transport(String::new()).user_message(),
            "Faucet failed: Unknown error"
        );
        assert_eq!(
            FaucetError::Rpc(Some("  ".into())).user_message(),
            "Faucet failed: Faucet error"
        );
    }
}
