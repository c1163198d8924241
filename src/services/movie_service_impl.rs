use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::cache::{CacheStatus, POPULAR_MOVIES_KEY, ResponseCache, movie_detail_key};
use crate::clients::MovieProvider;
use crate::models::movie::{DiscoverResponse, MovieSummary, RecommendationQuery};
use crate::services::movie_service::{MovieDetail, MovieError, MovieService, PopularMovies};

const POPULAR_PATH: &str = "movie/popular";
const DISCOVER_PATH: &str = "discover/movie";

/// [`MovieService`] backed by a [`MovieProvider`] and a [`ResponseCache`].
pub struct CachedMovieService {
    provider: Arc<dyn MovieProvider>,
    cache: ResponseCache,
    ttl: Duration,
}

impl CachedMovieService {
    #[must_use]
    pub fn new(provider: Arc<dyn MovieProvider>, cache: ResponseCache, ttl: Duration) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }
}

fn elapsed_secs(start: Instant) -> f64 {
    start.elapsed().as_secs_f64()
}

/// Takes `results` out of a `movie/popular` page. A missing list is empty;
/// any other JSON type is rejected before it can reach the cache.
fn popular_results(mut payload: Value) -> Result<Value, MovieError> {
    match payload.get_mut("results").map(Value::take) {
        None | Some(Value::Null) => Ok(Value::Array(Vec::new())),
        Some(list @ Value::Array(_)) => Ok(list),
        Some(other) => Err(MovieError::Malformed(format!(
            "popular movies `results` is not a list: {other}"
        ))),
    }
}

#[async_trait::async_trait]
impl MovieService for CachedMovieService {
    async fn popular_movies(&self) -> Result<PopularMovies, MovieError> {
        let start = Instant::now();

        let cached = self
            .cache
            .get_or_fetch(POPULAR_MOVIES_KEY, self.ttl, || async {
                self.provider
                    .fetch(POPULAR_PATH, &[("page", "1".to_string())])
                    .await
                    .map_err(MovieError::from)
                    .and_then(popular_results)
            })
            .await?;

        let Value::Array(movies) = cached.value else {
            return Err(MovieError::Malformed(
                "cached popular movies entry is not a list".to_string(),
            ));
        };

        info!(
            "Fetched {} popular movies ({:?}). Time taken: {:.6} seconds.",
            movies.len(),
            cached.status,
            elapsed_secs(start)
        );

        Ok(PopularMovies {
            movies,
            cache_status: cached.status,
        })
    }

    async fn movie_detail(&self, movie_id: i64) -> Result<MovieDetail, MovieError> {
        let start = Instant::now();
        let key = movie_detail_key(movie_id);
        let path = format!("movie/{movie_id}");

        let cached = self
            .cache
            .get_or_fetch(&key, self.ttl, || async {
                self.provider
                    .fetch(&path, &[])
                    .await
                    .map_err(MovieError::from)
            })
            .await?;

        match cached.status {
            CacheStatus::Hit => info!(
                "Cache HIT for '{}'. Time to fetch from cache: {:.6} seconds.",
                key,
                elapsed_secs(start)
            ),
            CacheStatus::Miss => info!(
                "Cache MISS for '{}'. Fetched from external API and cached. Time taken: {:.6} seconds.",
                key,
                elapsed_secs(start)
            ),
        }

        Ok(MovieDetail {
            movie: cached.value,
            cache_status: cached.status,
        })
    }

    async fn discover(
        &self,
        query: &RecommendationQuery,
    ) -> Result<Vec<MovieSummary>, MovieError> {
        let payload = self
            .provider
            .fetch(DISCOVER_PATH, &query.to_params())
            .await?;

        let response: DiscoverResponse =
            serde_json::from_value(payload).map_err(|e| MovieError::Malformed(e.to_string()))?;

        let movies: Vec<MovieSummary> = response
            .results
            .into_iter()
            .map(MovieSummary::from)
            .collect();

        info!("Fetched {} movie recommendations successfully.", movies.len());

        Ok(movies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::clients::UpstreamError;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider double: records every call and answers with the queued
    /// payloads in order, repeating the last one. No payloads means failure.
    struct FakeProvider {
        calls: AtomicUsize,
        requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
        responses: Mutex<VecDeque<Value>>,
    }

    impl FakeProvider {
        fn sequence(responses: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            })
        }

        fn returning(response: Value) -> Arc<Self> {
            Self::sequence(vec![response])
        }

        fn failing() -> Arc<Self> {
            Self::sequence(Vec::new())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl MovieProvider for FakeProvider {
        async fn fetch(
            &self,
            path: &str,
            params: &[(&str, String)],
        ) -> Result<Value, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push((
                path.to_string(),
                params
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect(),
            ));
            let mut responses = self.responses.lock().unwrap();
            let next = if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            };
            next.ok_or_else(|| UpstreamError::Decode("connection reset".to_string()))
        }
    }

    fn service(provider: Arc<FakeProvider>) -> CachedMovieService {
        CachedMovieService::new(
            provider,
            ResponseCache::new(Arc::new(MemoryCache::new())),
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn test_movie_detail_cached_after_first_fetch() {
        let provider =
            FakeProvider::returning(json!({"id": 20, "title": "Moana2", "release_date": "2023"}));
        let service = service(provider.clone());

        let first = service.movie_detail(20).await.unwrap();
        let second = service.movie_detail(20).await.unwrap();

        assert_eq!(first.cache_status, CacheStatus::Miss);
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.movie["title"], "Moana2");
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.requests.lock().unwrap()[0].0, "movie/20");
    }

    #[tokio::test]
    async fn test_popular_movies_extracts_results() {
        let provider = FakeProvider::returning(json!({
            "page": 1,
            "results": [{"id": 1}, {"id": 2}, {"id": 3}]
        }));
        let service = service(provider.clone());

        let first = service.popular_movies().await.unwrap();
        assert_eq!(first.movies.len(), 3);
        assert_eq!(first.cache_status, CacheStatus::Miss);

        let second = service.popular_movies().await.unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(provider.calls(), 1);

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].0, "movie/popular");
        assert_eq!(requests[0].1, vec![("page".to_string(), "1".to_string())]);
    }

    #[tokio::test]
    async fn test_popular_movies_without_results_is_empty() {
        let service = service(FakeProvider::returning(json!({"page": 1})));
        assert!(service.popular_movies().await.unwrap().movies.is_empty());
    }

    #[tokio::test]
    async fn test_popular_movies_non_list_results_not_cached() {
        let provider = FakeProvider::sequence(vec![
            json!({"results": {"oops": 1}}),
            json!({"results": [{"id": 1}, {"id": 2}]}),
        ]);
        let cache = ResponseCache::new(Arc::new(MemoryCache::new()));
        let service = CachedMovieService::new(
            provider.clone(),
            cache.clone(),
            Duration::from_secs(3600),
        );

        assert!(matches!(
            service.popular_movies().await,
            Err(MovieError::Malformed(_))
        ));
        assert_eq!(cache.client().get(POPULAR_MOVIES_KEY).await.unwrap(), None);

        let retry = service.popular_movies().await.unwrap();
        assert_eq!(retry.movies.len(), 2);
        assert_eq!(retry.cache_status, CacheStatus::Miss);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_discover_is_never_cached() {
        let provider = FakeProvider::returning(json!({
            "results": [
                {"title": "Movie 1", "release_date": "2023-01-01"},
                {"title": "Movie 2", "release_date": "2023-02-01"}
            ]
        }));
        let service = service(provider.clone());
        let query = RecommendationQuery {
            genres: vec!["Action".to_string()],
            language: "en".to_string(),
            release_year: Some(2023),
        };

        let movies = service.discover(&query).await.unwrap();
        service.discover(&query).await.unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].release_date.as_deref(), Some("2023-01-01"));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates_and_is_not_cached() {
        let provider = FakeProvider::failing();
        let service = service(provider.clone());

        assert!(matches!(
            service.movie_detail(5).await,
            Err(MovieError::Upstream(_))
        ));
        assert!(service.movie_detail(5).await.is_err());
        assert_eq!(provider.calls(), 2);
    }
}
