use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use super::envelope::Envelope;
use super::validation::{JsonBody, RatingRequest};
use super::{ApiError, AppState};

/// `POST /api/ratings/`
pub async fn save_rating(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RatingRequest>,
) -> Result<Envelope<()>, ApiError> {
    let rating = body.validate().map_err(ApiError::Validation)?;

    state.rating_service().save_rating(rating).await?;

    Ok(Envelope::empty()
        .with_status(StatusCode::CREATED)
        .with_message("Rating saved successfully!"))
}
