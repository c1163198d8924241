use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{CacheClient, CacheError};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process cache. Expired entries stay in the map until overwritten.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheClient for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(Instant::now()))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now().checked_add(ttl).ok_or_else(|| {
            CacheError::Backend(format!("ttl of {}s is out of range", ttl.as_secs()))
        })?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at - now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty().await);

        cache
            .set("movie_1", json!({"title": "Up"}), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get("movie_1").await.unwrap(),
            Some(json!({"title": "Up"}))
        );
        assert_eq!(cache.get("movie_2").await.unwrap(), None);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_expiry_is_lazy() {
        let cache = MemoryCache::new();
        cache
            .set("movie_1", json!(1), Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get("movie_1").await.unwrap(), None);
        assert_eq!(cache.ttl("movie_1").await.unwrap(), None);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_ttl_reports_remaining_lifetime() {
        let cache = MemoryCache::new();
        cache
            .set("popular_movies", json!([]), Duration::from_secs(3600))
            .await
            .unwrap();

        let remaining = cache.ttl("popular_movies").await.unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(3600));
        assert!(remaining > Duration::from_secs(3590));
    }

    #[tokio::test]
    async fn test_set_replaces_whole_entry() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("k", json!({"a": 1, "b": 2}), ttl).await.unwrap();
        cache.set("k", json!({"a": 3}), ttl).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(json!({"a": 3})));
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_is_an_error() {
        let cache = MemoryCache::new();
        let result = cache
            .set("movie_1", json!(1), Duration::from_secs(u64::MAX))
            .await;

        assert!(matches!(result, Err(CacheError::Backend(_))));
        assert!(cache.is_empty().await);
    }
}
