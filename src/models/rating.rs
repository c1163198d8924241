use serde::Serialize;

use crate::entities::ratings;

/// Validated rating submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewRating {
    pub movie_id: i64,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rating {
    pub id: i32,
    pub movie_id: i64,
    pub rating: f64,
    pub created_at: String,
}

impl From<ratings::Model> for Rating {
    fn from(model: ratings::Model) -> Self {
        Self {
            id: model.id,
            movie_id: model.movie_id,
            rating: model.rating,
            created_at: model.created_at,
        }
    }
}
