//! JSON-RPC 2.0 over HTTP (reqwest). For nodes that manage their own
//! accounts (anvil, hardhat, a local geth). No push events.

use super::Transport;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::cell::Cell;
use std::time::Duration;

pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    next_id: Cell<u64>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new(), next_id: Cell::new(1) }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        tracing::debug!(id, method, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(e.to_string()))?
            .error_for_status()
            .map_err(|e| ProviderError::new(e.to_string()))?;
        let reply: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new(format!("malformed rpc response: {}", e)))?;

        match reply {
            RpcResponse { error: Some(err), .. } => Err(ProviderError::with_code(err.code, err.message)),
            RpcResponse { result, .. } => Ok(result.unwrap_or(Value::Null)),
        }
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
