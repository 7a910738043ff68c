use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use super::client::JsonRpcClient;
use super::ConsolePortValidator;
use crate::errors::RpcError;
use crate::models::context::RequestContext;

/// Sends the port check to the cell router, which forwards it to the
/// cell hosting the instance.
pub struct CellsRpcClient {
    rpc: JsonRpcClient,
}

impl CellsRpcClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: JsonRpcClient::new(endpoint, timeout)?,
        })
    }
}

#[async_trait]
impl ConsolePortValidator for CellsRpcClient {
    fn name(&self) -> &'static str {
        "cells"
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
                    "instance_uuid": instance_uuid,
                    "console_port": port,
                    "console_type": console_type,
                }),
            )
            .await
    }
}
