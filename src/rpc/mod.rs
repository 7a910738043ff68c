pub mod cells;
pub mod client;
pub mod compute;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::RpcError;
use crate::models::context::RequestContext;

pub use cells::CellsRpcClient;
pub use compute::ComputeRpcClient;

/// Confirms that a console port still belongs to an instance.
/// Implementations: ComputeRpcClient (direct), CellsRpcClient (cell-routed).
#[async_trait]
pub trait ConsolePortValidator: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    async fn validate_console_port(
        &self,
        ctx: &RequestContext,
        instance_uuid: &str,
        port: &str,
        console_type: &str,
    ) -> Result<bool, RpcError>;
}

/// Pick the validator once, from `cells_enabled`.
pub fn from_config(cfg: &Config) -> Result<Arc<dyn ConsolePortValidator>, RpcError> {
    if cfg.cells_enabled {
        Ok(Arc::new(CellsRpcClient::new(&cfg.cells_rpc_url, cfg.rpc_timeout())?))
    } else {
        Ok(Arc::new(ComputeRpcClient::new(&cfg.compute_rpc_url, cfg.rpc_timeout())?))
    }
}
