//! Per-instance list of issued token ids, used for bulk revocation.
//!
//! The list has no TTL and outlives the tokens it names; a stale entry is
//! harmless because validity is decided by `TokenStore` alone.
//!
//! `add` is a read-modify-write. Two concurrent appends for the same
//! instance can lose one of them: the losing token stays valid until its
//! TTL but is missed by `delete_tokens_for_instance`.

use std::sync::Arc;

use crate::cache::CacheBackend;
use crate::codec;
use crate::errors::ConsoleAuthError;

#[derive(Clone)]
pub struct InstanceIndex {
    cache: Arc<dyn CacheBackend>,
}

impl InstanceIndex {
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache }
    }

    pub async fn add(&self, instance_uuid: &str, token_id: &str) -> Result<(), ConsoleAuthError> {
        let mut tokens = self.list(instance_uuid).await?;
        tokens.push(token_id.to_string());
        let value = codec::encode_index(&tokens)?;
        let stored = self
            .cache
            .set(&codec::instance_key(instance_uuid), &value, None)
            .await?;
        if !stored {
            return Err(ConsoleAuthError::Backend(
                "cache refused instance index write".into(),
            ));
        }
        Ok(())
    }

    /// Token ids in issue order; empty when the instance has none.
    pub async fn list(&self, instance_uuid: &str) -> Result<Vec<String>, ConsoleAuthError> {
        let Some(bytes) = self.cache.get(&codec::instance_key(instance_uuid)).await? else {
            return Ok(Vec::new());
        };
        match codec::decode_index(&bytes) {
            Ok(tokens) => Ok(tokens),
            Err(e) => {
                tracing::warn!(instance = instance_uuid, error = %e, "discarding corrupt instance token index");
                Ok(Vec::new())
            }
        }
    }

    pub async fn clear(&self, instance_uuid: &str) -> Result<(), ConsoleAuthError> {
        self.cache.delete(&codec::instance_key(instance_uuid)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    #[tokio::test]
    async fn test_add_appends_in_order() {
        let index = InstanceIndex::new(Arc::new(MemoryCache::new()));
        index.add("inst", "t1").await.unwrap();
        index.add("inst", "t2").await.unwrap();
        index.add("other", "t3").await.unwrap();
        assert_eq!(index.list("inst").await.unwrap(), vec!["t1", "t2"]);
        assert_eq!(index.list("other").await.unwrap(), vec!["t3"]);
    }

    #[tokio::test]
    async fn test_list_unknown_instance_is_empty() {
        let index = InstanceIndex::new(Arc::new(MemoryCache::new()));
        assert!(index.list("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_entry() {
        let index = InstanceIndex::new(Arc::new(MemoryCache::new()));
        index.add("inst", "t1").await.unwrap();
        index.clear("inst").await.unwrap();
        assert!(index.list("inst").await.unwrap().is_empty());
        // clearing twice is fine
        index.clear("inst").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_index_restarts_list() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set(&codec::instance_key("inst"), b"not-a-list", None)
            .await
            .unwrap();
        let index = InstanceIndex::new(cache);
        index.add("inst", "t1").await.unwrap();
        assert_eq!(index.list("inst").await.unwrap(), vec!["t1"]);
    }
}
