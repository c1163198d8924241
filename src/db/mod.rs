use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::ratings;

pub mod migrator;
pub mod repositories;

pub use repositories::cache::CachedResponse;
pub use repositories::user::User;

/// API key seeded for the bootstrap `admin` user.
pub const DEFAULT_API_KEY: &str = "reelrater_default_api_key_please_regenerate";

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        // Every connection to `sqlite::memory:` opens its own empty database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn rating_repo(&self) -> repositories::rating::RatingRepository {
        repositories::rating::RatingRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }

    pub async fn create_rating(&self, movie_id: i64, rating: f64) -> Result<ratings::Model> {
        self.rating_repo().create(movie_id, rating).await
    }

    pub async fn get_ratings_for_movie(&self, movie_id: i64) -> Result<Vec<ratings::Model>> {
        self.rating_repo().list_for_movie(movie_id).await
    }

    pub async fn count_ratings(&self) -> Result<u64> {
        self.rating_repo().count().await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn get_user_api_key(&self, username: &str) -> Result<Option<String>> {
        self.user_repo().get_api_key(username).await
    }

    pub async fn set_user_api_key(&self, username: &str, api_key: &str) -> Result<()> {
        self.user_repo().set_api_key(username, api_key).await
    }

    /// True while the seeded `admin` user still authenticates with [`DEFAULT_API_KEY`].
    pub async fn uses_default_api_key(&self) -> Result<bool> {
        let key = self.get_user_api_key("admin").await?;
        Ok(key.as_deref() == Some(DEFAULT_API_KEY))
    }

    pub async fn get_cached_response(
        &self,
        key: &str,
        now_ms: i64,
    ) -> Result<Option<CachedResponse>> {
        self.cache_repo().get_live(key, now_ms).await
    }

    pub async fn put_cached_response(
        &self,
        key: &str,
        payload_json: String,
        expires_at_ms: i64,
    ) -> Result<()> {
        self.cache_repo()
            .upsert(key, payload_json, expires_at_ms)
            .await
    }
}
