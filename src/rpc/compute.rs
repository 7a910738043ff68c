use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use super::client::JsonRpcClient;
use super::ConsolePortValidator;
use crate::errors::RpcError;
use crate::models::context::RequestContext;

/// Asks the compute service that owns the instance directly.
pub struct ComputeRpcClient {
    rpc: JsonRpcClient,
}

impl ComputeRpcClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: JsonRpcClient::new(endpoint, timeout)?,
        })
    }
}

#[async_trait]
impl ConsolePortValidator for ComputeRpcClient {
    fn name(&self) -> &'static str {
        "compute"
    }

    async fn validate_console_port(
        &self,
        ctx: &RequestContext,
        instance_uuid: &str,
        port: &str,
        console_type: &str,
    ) -> Result<bool, RpcError> {
        self.rpc
            .call_bool(
                "validate_console_port",
                json!({
                    "context": ctx,
                    "instance": { "uuid": instance_uuid },
                    "port": port,
                    "console_type": console_type,
                }),
            )
            .await
    }
}
