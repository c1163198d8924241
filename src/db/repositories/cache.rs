use crate::entities::{prelude::*, response_cache};
use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Raw cache row as stored; callers decide what "expired" means.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub payload_json: String,
    pub expires_at_ms: i64,
}

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the entry for `key` only if it expires after `now_ms`.
    pub async fn get_live(&self, key: &str, now_ms: i64) -> Result<Option<CachedResponse>> {
        let row = ResponseCache::find_by_id(key.to_string())
            .filter(response_cache::Column::ExpiresAtMs.gt(now_ms))
            .one(&self.conn)
            .await?;

        Ok(row.map(|m| CachedResponse {
            payload_json: m.payload_json,
            expires_at_ms: m.expires_at_ms,
        }))
    }

    /// Writes the whole row, replacing any previous payload for `key`.
    pub async fn upsert(&self, key: &str, payload_json: String, expires_at_ms: i64) -> Result<()> {
        let active_model = response_cache::ActiveModel {
            key: Set(key.to_string()),
            payload_json: Set(payload_json),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            expires_at_ms: Set(expires_at_ms),
        };

        ResponseCache::insert(active_model)
            .on_conflict(
                OnConflict::column(response_cache::Column::Key)
                    .update_columns([
                        response_cache::Column::PayloadJson,
                        response_cache::Column::CreatedAt,
                        response_cache::Column::ExpiresAtMs,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }
}
