use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, Query, State},
    http::HeaderMap,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use super::envelope::Envelope;
use super::pagination::{PageQuery, Paginated, paginate, request_url};
use super::validation::{JsonBody, RecommendationRequest, validate_movie_id};
use super::{ApiError, AppState};
use crate::cache::CacheStatus;
use crate::models::movie::MovieSummary;

/// `GET /api/movies/?page=N`
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<(Extension<CacheStatus>, Json<Paginated<Value>>), ApiError> {
    let start = Instant::now();

    let popular = state
        .movie_service()
        .popular_movies()
        .await
        .map_err(|e| ApiError::upstream("Error fetching movies", e))?;

    tracing::info!(
        count = popular.movies.len(),
        cache = popular.cache_status.as_str(),
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Fetched movies"
    );

    let base = request_url(&headers, &uri)?;
    let page = paginate(popular.movies, query.page.as_deref(), &base)?;
    Ok((Extension(popular.cache_status), Json(page)))
}

/// `GET /api/movie/{id}/`
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(Extension<CacheStatus>, Envelope<Value>), ApiError> {
    let movie_id = validate_movie_id(&id)?;

    let detail = state
        .movie_service()
        .movie_detail(movie_id)
        .await
        .map_err(|e| ApiError::upstream("Error fetching movie", e))?;

    let message = match detail.cache_status {
        CacheStatus::Hit => "Movie fetched from cache successfully",
        CacheStatus::Miss => "Movie fetched successfully",
    };

    Ok((
        Extension(detail.cache_status),
        Envelope::data(detail.movie).with_message(message),
    ))
}

/// `POST /api/recommendations/`
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RecommendationRequest>,
) -> Result<Envelope<Vec<MovieSummary>>, ApiError> {
    let query = body.validate().map_err(ApiError::Validation)?;

    let movies = state
        .movie_service()
        .discover(&query)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch recommendations", e))?;

    tracing::info!(count = movies.len(), "Fetched movie recommendations successfully.");

    Ok(Envelope::data(movies).with_message("Recommendations fetched successfully"))
}
