//! Background job: drop expired entries from the in-process token cache.
//!
//! Reads already ignore expired entries; this only bounds memory for tokens
//! that are never looked up again.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

use crate::cache::MemoryCache;

/// Spawn the sweep task. Call this once at startup.
pub fn spawn(cache: MemoryCache, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        loop {
            interval.tick().await;
            let evicted = cache.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted = evicted, remaining = cache.len(), "swept expired console tokens");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_in_background() {
        let cache = MemoryCache::new();
        cache
            .set(b"k", b"v", Some(Duration::from_secs(1)))
            .await
            .unwrap();

        let handle = spawn(cache.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(cache.is_empty());
        handle.abort();
    }
}
