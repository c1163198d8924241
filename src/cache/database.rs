use serde_json::Value;
use std::time::Duration;

use super::{CacheClient, CacheError};
use crate::db::Store;

/// Cache entries persisted in the `response_cache` table so they survive
/// restarts and are shared by every process using the same database.
#[derive(Clone)]
pub struct DatabaseCache {
    store: Store,
}

impl DatabaseCache {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait::async_trait]
impl CacheClient for DatabaseCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let Some(row) = self.store.get_cached_response(key, now_ms()).await? else {
            return Ok(None);
        };

        Ok(Some(serde_json::from_str(&row.payload_json)?))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at_ms = now_ms().saturating_add(ttl_ms);
        let payload = serde_json::to_string(&value)?;

        self.store
            .put_cached_response(key, payload, expires_at_ms)
            .await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let now = now_ms();
        let row = self.store.get_cached_response(key, now).await?;

        Ok(row.map(|r| {
            Duration::from_millis(u64::try_from(r.expires_at_ms - now).unwrap_or_default())
        }))
    }
}
