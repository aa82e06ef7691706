//! JSON-RPC chain connection over HTTP.
//!
//! Speaks the Solana RPC node protocol: `sendTransaction` for submission,
//! `getSignatureStatuses` polled until the requested commitment is reached.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ChainConnection, Commitment, SettlementError};

/// How often the confirmation poll re-queries the node.
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll attempts before confirmation is abandoned (~30s at the interval
/// above, matching the node's default transaction validity window).
const CONFIRM_POLL_ATTEMPTS: u32 = 60;

/// [`ChainConnection`] backed by an HTTP JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct HttpChainConnection {
    client: reqwest::Client,
    url: String,
}

impl HttpChainConnection {
    /// Connection to the node at `url` (e.g. `https://api.devnet.solana.com`).
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Issue one JSON-RPC call and return the `result` field.
    async fn call(&self, method: &str, params: Value) -> Result<Value, SettlementError> {
        let body = rpc_request(method, params);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SettlementError::Transaction(format!("rpc request failed: {e}")))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| SettlementError::Transaction(format!("invalid rpc response: {e}")))?;

        if let Some(err) = payload.get("error") {
            return Err(SettlementError::Transaction(format!("rpc error: {err}")));
        }

        Ok(payload.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChainConnection for HttpChainConnection {
    async fn submit(&self, wire_tx: &str) -> Result<String, SettlementError> {
        let result = self
            .call(
                "sendTransaction",
                json!([wire_tx, { "encoding": "base64" }]),
            )
            .await?;

        result
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| {
                SettlementError::Transaction("sendTransaction returned no signature".to_string())
            })
    }

    async fn confirm_transaction(
        &self,
        signature: &str,
        commitment: Commitment,
    ) -> Result<(), SettlementError> {
        for _ in 0..CONFIRM_POLL_ATTEMPTS {
            let result = self
                .call("getSignatureStatuses", json!([[signature]]))
                .await?;

            let status = &result["value"][0];
            if !status.is_null() {
                if !status["err"].is_null() {
                    return Err(SettlementError::Transaction(format!(
                        "transaction {signature} failed on chain: {}",
                        status["err"]
                    )));
                }
                if status["confirmationStatus"]
                    .as_str()
                    .is_some_and(|s| commitment.is_satisfied_by(s))
                {
                    return Ok(());
                }
            }

            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }

        Err(SettlementError::Transaction(format!(
            "transaction {signature} not {} after {CONFIRM_POLL_ATTEMPTS} polls",
            commitment.as_str()
        )))
    }
}

/// Build a JSON-RPC 2.0 request envelope.
fn rpc_request(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_envelope_shape() {
        let req = rpc_request("getSignatureStatuses", json!([["abc"]]));
        assert_eq!(req["jsonrpc"], "2.0");
        assert_eq!(req["method"], "getSignatureStatuses");
        assert_eq!(req["params"][0][0], "abc");
    }

    #[test]
    fn send_transaction_envelope_carries_encoding() {
        let req = rpc_request("sendTransaction", json!(["dGVzdA==", { "encoding": "base64" }]));
        assert_eq!(req["params"][0], "dGVzdA==");
        assert_eq!(req["params"][1]["encoding"], "base64");
    }
}
