use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheBackend;
use crate::codec;
use crate::errors::ConsoleAuthError;
use crate::models::token::ConsoleToken;

/// Console token records keyed by token id, each with its own TTL.
#[derive(Clone)]
pub struct TokenStore {
    cache: Arc<dyn CacheBackend>,
}

impl TokenStore {
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache }
    }

    pub async fn put(
        &self,
        token_id: &str,
        record: &ConsoleToken,
        ttl: Duration,
    ) -> Result<(), ConsoleAuthError> {
        let value = codec::encode_token(record)?;
        let stored = self
            .cache
            .set(&codec::token_key(token_id), &value, Some(ttl))
            .await?;
        if !stored {
            return Err(ConsoleAuthError::Backend(
                "cache refused console token write".into(),
            ));
        }
        Ok(())
    }

    /// Never written, expired and corrupt all come back as `None`.
    /// Only a failing backend is an error.
    pub async fn get(&self, token_id: &str) -> Result<Option<ConsoleToken>, ConsoleAuthError> {
        let Some(bytes) = self.cache.get(&codec::token_key(token_id)).await? else {
            return Ok(None);
        };
        match codec::decode_token(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(token = token_id, error = %e, "discarding corrupt console token");
                Ok(None)
            }
        }
    }

    pub async fn delete(&self, token_id: &str) -> Result<(), ConsoleAuthError> {
        self.cache.delete(&codec::token_key(token_id)).await?;
        Ok(())
    }
}
