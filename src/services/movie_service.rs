//! Domain service for movie metadata lookups.
//!
//! Handlers talk to [`MovieService`] instead of the provider client so the
//! caching policy lives in one place and can be swapped in tests.

use serde_json::Value;
use thiserror::Error;

use crate::cache::CacheStatus;
use crate::clients::UpstreamError;
use crate::models::movie::{MovieSummary, RecommendationQuery};

#[derive(Debug, Error)]
pub enum MovieError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("unexpected provider payload: {0}")]
    Malformed(String),
}

/// A single movie object plus where it came from.
#[derive(Debug, Clone)]
pub struct MovieDetail {
    pub movie: Value,
    pub cache_status: CacheStatus,
}

#[derive(Debug, Clone)]
pub struct PopularMovies {
    pub movies: Vec<Value>,
    pub cache_status: CacheStatus,
}

#[async_trait::async_trait]
pub trait MovieService: Send + Sync {
    /// Full popular-movies list, cached under `popular_movies`.
    ///
    /// # Errors
    ///
    /// Returns [`MovieError::Upstream`] when the list is not cached and the
    /// provider call fails.
    /// [`MovieError::Malformed`] when `results` is not a list; such a payload
    /// is never cached.
    async fn popular_movies(&self) -> Result<PopularMovies, MovieError>;

    /// One movie, cached under `movie_{id}`.
    async fn movie_detail(&self, movie_id: i64) -> Result<MovieDetail, MovieError>;

    /// Genre/language/year discovery. Never cached.
    async fn discover(&self, query: &RecommendationQuery)
    -> Result<Vec<MovieSummary>, MovieError>;
}
