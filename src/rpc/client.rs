//! JSON-RPC over HTTP POST, shared by both validator variants.

use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::types::{RpcCall, RpcReply};
use crate::errors::RpcError;

pub struct JsonRpcClient {
    endpoint: String,
    http: Client,
    request_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Send one request and return its `result` member.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id();
        let call = RpcCall::new(id, method, params);

        let resp = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&call)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: RpcReply = resp.json().await?;
        reply.into_result(id)
    }

    /// `call` for methods whose result must be a JSON boolean.
    pub async fn call_bool(&self, method: &str, params: Value) -> Result<bool, RpcError> {
        match self.call(method, params).await? {
            Value::Bool(b) => Ok(b),
            other => Err(RpcError::InvalidResult(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = JsonRpcClient::new("http://localhost:8774/rpc", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8774/rpc");
    }

    #[test]
    fn test_request_id_increments() {
        let client = JsonRpcClient::new("http://localhost/rpc", Duration::from_secs(1)).unwrap();
        let id1 = client.next_id();
        let id2 = client.next_id();
        assert_eq!(id2, id1 + 1);
    }
}
