//! Console token manager.
//!
//! Issues console tokens, answers whether a presented token is still good
//! and revokes every token of an instance. A token is good only while its
//! record is in the cache *and* the validator confirms the console port
//! still belongs to the instance. Any validator failure counts as "no".

use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheBackend;
use crate::config::Config;
use crate::errors::{ConsoleAuthError, RpcError};
use crate::models::context::RequestContext;
use crate::models::token::{ConsoleGrant, ConsoleToken};
use crate::rpc::{self, ConsolePortValidator};
use crate::store::{InstanceIndex, TokenStore};

/// Holds no mutable state of its own; share one instance behind an `Arc`.
pub struct ConsoleAuthManager {
    tokens: TokenStore,
    index: InstanceIndex,
    validator: Arc<dyn ConsolePortValidator>,
    token_ttl: Duration,
    validation_timeout: Duration,
}

impl ConsoleAuthManager {
    /// Build a manager whose validator is chosen by `cfg.cells_enabled`.
    pub fn from_config(
        cfg: &Config,
        cache: Arc<dyn CacheBackend>,
    ) -> Result<Self, ConsoleAuthError> {
        let validator = rpc::from_config(cfg)?;
        Ok(Self::new(cache, validator, cfg.token_ttl(), cfg.rpc_timeout()))
    }

    pub fn new(
        cache: Arc<dyn CacheBackend>,
        validator: Arc<dyn ConsolePortValidator>,
        token_ttl: Duration,
        validation_timeout: Duration,
    ) -> Self {
        Self {
            tokens: TokenStore::new(cache.clone()),
            index: InstanceIndex::new(cache),
            validator,
            token_ttl,
            validation_timeout,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Store a console token and remember it under its instance.
    ///
    /// A grant without an instance is refused silently: nothing is written
    /// and the call succeeds, so the token simply never checks out.
    pub async fn authorize_console(
        &self,
        _ctx: &RequestContext,
        token: &str,
        grant: ConsoleGrant,
    ) -> Result<(), ConsoleAuthError> {
        let Some(record) = grant.into_token(token) else {
            tracing::warn!(token = token, "refusing console token without an instance");
            return Ok(());
        };

        self.tokens.put(token, &record, self.token_ttl).await?;
        self.index.add(&record.instance_uuid, token).await?;

        tracing::info!(
            token = token,
            instance = %record.instance_uuid,
            console_type = %record.console_type,
            host = %record.host,
            port = %record.port,
            ttl_secs = self.token_ttl.as_secs(),
            "received console token"
        );
        Ok(())
    }

    /// Authorize under a freshly generated token id and return it.
    pub async fn issue_console(
        &self,
        ctx: &RequestContext,
        grant: ConsoleGrant,
    ) -> Result<String, ConsoleAuthError> {
        let token = uuid::Uuid::new_v4().to_string();
        self.authorize_console(ctx, &token, grant).await?;
        Ok(token)
    }

    pub async fn check_token(&self, ctx: &RequestContext, token: &str) -> bool {
        self.connect_info(ctx, token).await.is_some()
    }

    /// The stored connection info if the token is still valid.
    pub async fn connect_info(&self, ctx: &RequestContext, token: &str) -> Option<ConsoleToken> {
        let record = match self.tokens.get(token).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(token = token, error = %e, "console token lookup failed");
                None
            }
        };

        let valid = match &record {
            Some(record) => self.validate(ctx, record).await,
            None => false,
        };
        tracing::info!(token = token, valid = valid, "checking console token");

        if valid {
            record
        } else {
            None
        }
    }

    async fn validate(&self, ctx: &RequestContext, record: &ConsoleToken) -> bool {
        let call = self.validator.validate_console_port(
            ctx,
            &record.instance_uuid,
            &record.port,
            &record.console_type,
        );
        let outcome = match tokio::time::timeout(self.validation_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RpcError::Timeout(self.validation_timeout)),
        };

        match outcome {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(
                    validator = self.validator.name(),
                    instance = %record.instance_uuid,
                    port = %record.port,
                    error = %e,
                    "console port validation failed; treating token as invalid"
                );
                false
            }
        }
    }

    /// Revoke every indexed token of an instance, then drop the index.
    pub async fn delete_tokens_for_instance(
        &self,
        _ctx: &RequestContext,
        instance_uuid: &str,
    ) -> Result<(), ConsoleAuthError> {
        let tokens = self.index.list(instance_uuid).await?;
        for token in &tokens {
            self.tokens.delete(token).await?;
        }
        self.index.clear(instance_uuid).await?;

        tracing::info!(
            instance = instance_uuid,
            revoked = tokens.len(),
            "deleted console tokens for instance"
        );
        Ok(())
    }

    /// Token ids currently indexed for an instance. May include tokens that
    /// have already expired.
    pub async fn tokens_for_instance(
        &self,
        instance_uuid: &str,
    ) -> Result<Vec<String>, ConsoleAuthError> {
        self.index.list(instance_uuid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use async_trait::async_trait;

    struct Slow;

    #[async_trait]
    impl ConsolePortValidator for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn validate_console_port(
            &self,
            _ctx: &RequestContext,
            _instance_uuid: &str,
            _port: &str,
            _console_type: &str,
        ) -> Result<bool, RpcError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(true)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_validator_timeout_fails_closed() {
        let manager = ConsoleAuthManager::new(
            Arc::new(MemoryCache::new()),
            Arc::new(Slow),
            Duration::from_secs(600),
            Duration::from_secs(5),
        );
        let ctx = RequestContext::admin();
        let grant = ConsoleGrant::new("novnc", "127.0.0.1", "8080", None, Some("inst".into()));
        manager.authorize_console(&ctx, "tok", grant).await.unwrap();

        assert!(!manager.check_token(&ctx, "tok").await);
        // record is left in place for the next check
        assert_eq!(manager.tokens_for_instance("inst").await.unwrap(), vec!["tok"]);
    }
}
