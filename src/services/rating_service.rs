//! Domain service for user-submitted ratings.

use thiserror::Error;

use crate::models::rating::{NewRating, Rating};

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for RatingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RatingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Persistence for ratings. Records are append-only.
#[async_trait::async_trait]
pub trait RatingService: Send + Sync {
    /// Stores one rating and returns the saved record.
    async fn save_rating(&self, rating: NewRating) -> Result<Rating, RatingError>;
}
