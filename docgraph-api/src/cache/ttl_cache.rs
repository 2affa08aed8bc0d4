//! Fixed-expiry in-memory cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Values keyed by an opaque string, each kept for `ttl` after insertion.
///
/// Cloning the cache shares its storage.
pub struct TtlCache<V> {
    entries: Arc<RwLock<HashMap<String, Entry<V>>>>,
    ttl: Duration,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value under `key`, if any.
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key`, replacing any previous entry. Expired entries are purged.
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn remove(&self, key: &str) -> Option<V> {
        self.entries.write().await.remove(key).map(|entry| entry.value)
    }

    /// Number of stored entries, expired ones included until the next insert.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Return the live value under `key`, or compute, store and return it.
    ///
    /// Failures are returned as is and nothing is stored. Concurrent misses may both compute.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        let value = compute().await?;
        self.insert(key, value.clone()).await;

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = TtlCache::new(Duration::from_secs(30));
        cache.insert("a", 1).await;
        assert_eq!(cache.get("a").await, Some(1));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get("a").await, Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("a").await, None);

        cache.insert("b", 2).await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));

        let first: Result<String, ()> = cache
            .get_or_try_insert_with("k", || async { Ok("computed".to_string()) })
            .await;
        assert_eq!(first.unwrap(), "computed");

        let second: Result<String, ()> = cache
            .get_or_try_insert_with("k", || async { Err(()) })
            .await;
        assert_eq!(second.unwrap(), "computed");

        let failed: Result<String, &str> = cache
            .get_or_try_insert_with("other", || async { Err("boom") })
            .await;
        assert_eq!(failed.unwrap_err(), "boom");
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_remove_and_shared_clones() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let shared = cache.clone();

        cache.insert("a", 1).await;
        assert_eq!(shared.get("a").await, Some(1));
        assert_eq!(shared.remove("a").await, Some(1));
        assert!(cache.is_empty().await);
    }
}
