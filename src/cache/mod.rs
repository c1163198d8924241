//! Response caching for upstream lookups.
//!
//! [`ResponseCache`] implements get-or-fetch over any [`CacheClient`]
//! backend. Entries expire lazily: an expired entry reads as absent and is
//! overwritten by the next miss. There is no eviction, no invalidation API and
//! no single-flight, so concurrent misses for one key may each call upstream
//! and the last write wins.

pub mod database;
pub mod memory;

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub use database::DatabaseCache;
pub use memory::MemoryCache;

pub const POPULAR_MOVIES_KEY: &str = "popular_movies";

#[must_use]
pub fn movie_detail_key(movie_id: i64) -> String {
    format!("movie_{movie_id}")
}

/// Label for metrics: `movie_20` and `movie_21` both report as `movie`.
fn key_family(key: &str) -> &str {
    key.trim_end_matches(|c: char| c.is_ascii_digit())
        .trim_end_matches('_')
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cached payload is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<anyhow::Error> for CacheError {
    fn from(err: anyhow::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Key/value storage behind the response cache.
#[async_trait::async_trait]
pub trait CacheClient: Send + Sync {
    /// Returns the stored value if present and not yet expired.
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores `value` under `key`, replacing any previous entry, expiring after `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Remaining lifetime of a live entry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cached {
    pub value: Value,
    pub status: CacheStatus,
}

#[derive(Clone)]
pub struct ResponseCache {
    client: Arc<dyn CacheClient>,
}

impl ResponseCache {
    #[must_use]
    pub fn new(client: Arc<dyn CacheClient>) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<dyn CacheClient> {
        &self.client
    }

    /// Returns the live entry for `key`, or runs `fetch` and stores its result
    /// for `ttl`. A failed fetch propagates and leaves the cache untouched.
    ///
    /// Backend failures never fail the request: a read error counts as a miss
    /// and a write error is only logged.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<Cached, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Value, E>> + Send,
    {
        let family = key_family(key).to_string();
        let start = Instant::now();

        match self.client.get(key).await {
            Ok(Some(value)) => {
                metrics::counter!("cache_hits_total", "key" => family).increment(1);
                debug!(
                    key,
                    elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
                    "Cache HIT"
                );
                return Ok(Cached {
                    value,
                    status: CacheStatus::Hit,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(key, error = %e, "Cache read failed, treating as miss"),
        }

        metrics::counter!("cache_misses_total", "key" => family).increment(1);

        let value = fetch().await?;

        if let Err(e) = self.client.set(key, value.clone(), ttl).await {
            warn!(key, error = %e, "Failed to store cache entry");
        }

        debug!(
            key,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Cache MISS, fetched and stored"
        );

        Ok(Cached {
            value,
            status: CacheStatus::Miss,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn memory_cache() -> ResponseCache {
        ResponseCache::new(Arc::new(MemoryCache::new()))
    }

    async fn counted_fetch(calls: &AtomicUsize, value: Value) -> Result<Value, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[test]
    fn test_keys() {
        assert_eq!(POPULAR_MOVIES_KEY, "popular_movies");
        assert_eq!(movie_detail_key(20), "movie_20");
        assert_eq!(key_family("movie_20"), "movie");
        assert_eq!(key_family("popular_movies"), "popular_movies");
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_hit() {
        let cache = memory_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(3600);

        let first = cache
            .get_or_fetch("movie_1", ttl, || counted_fetch(&calls, json!({"id": 1})))
            .await
            .unwrap();
        let second = cache
            .get_or_fetch("movie_1", ttl, || counted_fetch(&calls, json!({"id": 999})))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.status, CacheStatus::Miss);
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(second.value, json!({"id": 1}));
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched_and_overwritten() {
        let cache = memory_cache();
        let calls = AtomicUsize::new(0);

        cache
            .get_or_fetch("movie_2", Duration::ZERO, || {
                counted_fetch(&calls, json!({"v": "old"}))
            })
            .await
            .unwrap();

        let refreshed = cache
            .get_or_fetch("movie_2", Duration::from_secs(60), || {
                counted_fetch(&calls, json!({"v": "new"}))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.status, CacheStatus::Miss);
        assert_eq!(
            cache.client().get("movie_2").await.unwrap(),
            Some(json!({"v": "new"}))
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = memory_cache();
        let ttl = Duration::from_secs(60);

        let result = cache
            .get_or_fetch("popular_movies", ttl, || async {
                Err::<Value, _>("upstream down".to_string())
            })
            .await;
        assert_eq!(result.unwrap_err(), "upstream down");
        assert_eq!(cache.client().get("popular_movies").await.unwrap(), None);

        let calls = AtomicUsize::new(0);
        let retry = cache
            .get_or_fetch("popular_movies", ttl, || counted_fetch(&calls, json!([])))
            .await
            .unwrap();
        assert_eq!(retry.status, CacheStatus::Miss);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_may_both_fetch() {
        // No single-flight: both callers may reach upstream. Collapsing them
        // into one call would also satisfy this test.
        let cache = memory_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        let (a, b) = tokio::join!(
            cache.get_or_fetch("movie_3", ttl, || counted_fetch(&calls, json!({"id": 3}))),
            cache.get_or_fetch("movie_3", ttl, || counted_fetch(&calls, json!({"id": 3}))),
        );

        assert_eq!(a.unwrap().value, json!({"id": 3}));
        assert_eq!(b.unwrap().value, json!({"id": 3}));
        let n = calls.load(Ordering::SeqCst);
        assert!((1..=2).contains(&n));
    }

    struct BrokenBackend;

    #[async_trait::async_trait]
    impl CacheClient for BrokenBackend {
        async fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
            Err(CacheError::Backend("unavailable".to_string()))
        }

        async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("unavailable".to_string()))
        }

        async fn ttl(&self, _key: &str) -> Result<Option<Duration>, CacheError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_backend_failure_falls_through_to_fetch() {
        let cache = ResponseCache::new(Arc::new(BrokenBackend));
        let calls = AtomicUsize::new(0);

        let result = cache
            .get_or_fetch("movie_4", Duration::from_secs(60), || {
                counted_fetch(&calls, json!({"id": 4}))
            })
            .await
            .unwrap();

        assert_eq!(result.status, CacheStatus::Miss);
        assert_eq!(result.value, json!({"id": 4}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
