use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{CacheClient, DatabaseCache, MemoryCache, ResponseCache};
use crate::clients::{MovieProvider, TmdbClient};
use crate::config::{CacheBackend, Config};
use crate::db::Store;
use crate::services::{CachedMovieService, MovieService, RatingService, SeaOrmRatingService};

/// Build a shared HTTP client so every upstream call reuses one connection pool.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("ReelRater/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub response_cache: ResponseCache,

    pub movie_service: Arc<dyn MovieService>,

    pub rating_service: Arc<dyn RatingService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(config.tmdb.request_timeout_seconds)?;
        let tmdb = TmdbClient::with_shared_client(http_client, &config.tmdb)
            .context("Invalid TMDB base URL")?;

        Self::with_provider(config, Arc::new(tmdb)).await
    }

    /// Builds the state around an already constructed movie provider.
    pub async fn with_provider(
        config: Config,
        provider: Arc<dyn MovieProvider>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        if let Some(key) = config.auth.bootstrap_api_key.as_deref()
            && !key.is_empty()
        {
            store
                .set_user_api_key("admin", key)
                .await
                .context("Failed to apply bootstrap API key")?;
            info!("Bootstrap API key applied to admin user");
        }

        if store.uses_default_api_key().await? {
            warn!(
                "admin still uses the default API key, which is public; set auth.bootstrap_api_key to replace it"
            );
        }

        let cache_client: Arc<dyn CacheClient> = match config.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Database => Arc::new(DatabaseCache::new(store.clone())),
        };
        info!(
            backend = ?config.cache.backend,
            ttl_seconds = config.cache.ttl_seconds,
            "Response cache ready"
        );
        let response_cache = ResponseCache::new(cache_client);

        let movie_service = Arc::new(CachedMovieService::new(
            provider,
            response_cache.clone(),
            config.cache.ttl(),
        )) as Arc<dyn MovieService + Send + Sync + 'static>;

        let rating_service = Arc::new(SeaOrmRatingService::new(store.clone()))
            as Arc<dyn RatingService + Send + Sync + 'static>;

        Ok(Self {
            config,
            store,
            response_cache,
            movie_service,
            rating_service,
        })
    }
}
