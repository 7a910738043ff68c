use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::ConsoleAuthError;

/// Minimal key-value capability the token manager is built on.
///
/// Keys and values are always already encoded by `codec`; no backend ever
/// sees native text. Implementations: `MemoryCache` (in-process) and
/// `RedisCache`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Store `value` under `key`. With `ttl == None` the entry never expires.
    async fn set(
        &self,
        key: &[u8],
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool, ConsoleAuthError>;

    /// Fetch the value under `key`, `None` if absent or expired.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ConsoleAuthError>;

    /// Remove `key`. Returns whether something was removed; removing an
    /// absent key is not an error.
    async fn delete(&self, key: &[u8]) -> Result<bool, ConsoleAuthError>;
}

fn check_ttl(ttl: Option<Duration>) -> Result<(), ConsoleAuthError> {
    match ttl {
        Some(d) if d.is_zero() => Err(ConsoleAuthError::InvalidInput(
            "cache ttl must be positive".into(),
        )),
        _ => Ok(()),
    }
}

/// Entry stored in the in-process map with an optional expiry timestamp.
#[derive(Clone)]
pub(crate) struct CacheEntry {
    value: Vec<u8>,
    pub(crate) expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-process cache used when no Redis is configured.
///
/// Expiry is checked on read and entries are evicted lazily. `evict_expired()`
/// bounds memory and is driven by the sweep job. Uses tokio's clock so a
/// paused test runtime controls expiry.
#[derive(Clone, Default)]
pub struct MemoryCache {
    pub(crate) entries: Arc<DashMap<Vec<u8>, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all expired entries, returning how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        // counted per entry: retain locks one shard at a time, so writers
        // can change len() while it runs
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let live = entry.is_live(now);
            if !live {
                evicted += 1;
            }
            live
        });
        evicted
    }

    /// Number of entries held, expired-but-unswept ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn set(
        &self,
        key: &[u8],
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool, ConsoleAuthError> {
        check_ttl(ttl)?;
        self.entries.insert(
            key.to_vec(),
            CacheEntry {
                value: value.to_vec(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ConsoleAuthError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.clone()));
            }
            // expired, drop the ref before removing
            drop(entry);
            // a set may have replaced it since; only remove what is still expired
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(None)
    }

    async fn delete(&self, key: &[u8]) -> Result<bool, ConsoleAuthError> {
        Ok(self.entries.remove(key).is_some())
    }
}

/// Redis-backed cache shared by every consoleauth worker.
#[derive(Clone)]
pub struct RedisCache {
    redis: ConnectionManager,
}

impl RedisCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub async fn connect(url: &str) -> Result<Self, ConsoleAuthError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn set(
        &self,
        key: &[u8],
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool, ConsoleAuthError> {
        check_ttl(ttl)?;
        let mut conn = self.redis.clone();
        match ttl {
            // EX has whole-second granularity; round sub-second TTLs up
            Some(d) => {
                let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
                conn.set_ex::<_, _, ()>(key, value, secs).await?
            }
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(true)
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ConsoleAuthError> {
        let mut conn = self.redis.clone();
        Ok(conn.get::<_, Option<Vec<u8>>>(key).await?)
    }

    async fn delete(&self, key: &[u8]) -> Result<bool, ConsoleAuthError> {
        let mut conn = self.redis.clone();
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_memory_cache_expires_entries() {
        let cache = MemoryCache::new();
        cache
            .set(b"k", b"v", Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(cache.get(b"k").await.unwrap(), Some(b"v".to_vec()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(b"k").await.unwrap(), None);
        // lazy eviction removed it on read
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_cache_without_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set(b"idx", b"[]", None).await.unwrap();
        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert_eq!(cache.get(b"idx").await.unwrap(), Some(b"[]".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired_counts_swept_entries() {
        let cache = MemoryCache::new();
        cache.set(b"a", b"1", Some(Duration::from_secs(1))).await.unwrap();
        cache.set(b"b", b"2", Some(Duration::from_secs(5))).await.unwrap();
        cache.set(b"c", b"3", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = MemoryCache::new();
        cache.set(b"k", b"v", None).await.unwrap();
        assert!(cache.delete(b"k").await.unwrap());
        assert!(!cache.delete(b"k").await.unwrap());
    }

    #[test]
    fn test_evict_expired_with_concurrent_writers() {
        let cache = MemoryCache::new();
        let writers: Vec<_> = (0..3)
            .map(|w| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..20_000u32 {
                        let key = format!("{}-{}", w, i % 512).into_bytes();
                        cache.entries.insert(
                            key,
                            CacheEntry {
                                value: b"v".to_vec(),
                                expires_at: Some(Instant::now()),
                            },
                        );
                    }
                })
            })
            .collect();

        let mut total = 0;
        for _ in 0..20_000 {
            total += cache.evict_expired();
        }
        for writer in writers {
            writer.join().unwrap();
        }
        total += cache.evict_expired();
        assert!(cache.is_empty());
        assert!(total <= 3 * 20_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fresh_write_survives_lazy_expiry() {
        let cache = MemoryCache::new();
        for _ in 0..2_000 {
            cache.entries.insert(
                b"tok".to_vec(),
                CacheEntry {
                    value: b"old".to_vec(),
                    expires_at: Some(Instant::now()),
                },
            );

            let writer = {
                let cache = cache.clone();
                tokio::spawn(async move {
                    cache
                        .set(b"tok", b"new", Some(Duration::from_secs(600)))
                        .await
                        .unwrap();
                })
            };
            let reader = {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get(b"tok").await.unwrap() })
            };
            writer.await.unwrap();
            let seen = reader.await.unwrap();
            assert!(seen.is_none() || seen.as_deref() == Some(&b"new"[..]));

            assert_eq!(cache.get(b"tok").await.unwrap(), Some(b"new".to_vec()));
        }
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let cache = MemoryCache::new();
        let err = cache.set(b"k", b"v", Some(Duration::ZERO)).await;
        assert!(matches!(err, Err(ConsoleAuthError::InvalidInput(_))));
        assert!(cache.is_empty());
    }
}
