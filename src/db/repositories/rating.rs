use crate::entities::{prelude::*, ratings};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

pub struct RatingRepository {
    conn: DatabaseConnection,
}

impl RatingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, movie_id: i64, rating: f64) -> Result<ratings::Model> {
        let active_model = ratings::ActiveModel {
            movie_id: Set(movie_id),
            rating: Set(rating),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert rating")
    }

    pub async fn list_for_movie(&self, movie_id: i64) -> Result<Vec<ratings::Model>> {
        Ratings::find()
            .filter(ratings::Column::MovieId.eq(movie_id))
            .order_by_asc(ratings::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query ratings for movie")
    }

    pub async fn count(&self) -> Result<u64> {
        Ratings::find()
            .count(&self.conn)
            .await
            .context("Failed to count ratings")
    }
}
