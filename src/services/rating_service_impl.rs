use tracing::info;

use crate::db::Store;
use crate::models::rating::{NewRating, Rating};
use crate::services::rating_service::{RatingError, RatingService};

pub struct SeaOrmRatingService {
    store: Store,
}

impl SeaOrmRatingService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl RatingService for SeaOrmRatingService {
    async fn save_rating(&self, rating: NewRating) -> Result<Rating, RatingError> {
        let saved = self
            .store
            .create_rating(rating.movie_id, rating.rating)
            .await?;

        info!(
            movie_id = saved.movie_id,
            rating = saved.rating,
            "Movie rating saved successfully."
        );

        Ok(Rating::from(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_rating_persists_one_row() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let service = SeaOrmRatingService::new(store.clone());

        let saved = service
            .save_rating(NewRating {
                movie_id: 1,
                rating: 4.5,
            })
            .await
            .unwrap();

        assert_eq!(saved.movie_id, 1);
        assert_eq!(store.count_ratings().await.unwrap(), 1);

        let rows = store.get_ratings_for_movie(1).await.unwrap();
        assert!((rows[0].rating - 4.5).abs() < f64::EPSILON);
    }
}
