use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use super::envelope::Envelope;
use super::validation::FieldErrors;
use crate::services::RatingError;

pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
pub const INVALID_API_KEY: &str = "Invalid API key.";

#[derive(Debug)]
pub enum ApiError {
    /// Field name to messages, rendered as the envelope's `errors`.
    Validation(FieldErrors),

    /// Provider failure. `message` is the endpoint-specific summary.
    Upstream { message: String, cause: String },

    Unauthorized(String),

    InvalidPage,

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => {
                write!(f, "Validation error: ")?;
                let mut first = true;
                for (field, messages) in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}: {}", field, messages.join(" "))?;
                    first = false;
                }
                Ok(())
            }
            ApiError::Upstream { message, cause } => write!(f, "{}: {}", message, cause),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::InvalidPage => write!(f, "Invalid page."),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                Envelope::errors(json!(errors), StatusCode::BAD_REQUEST, "Invalid input")
                    .into_response()
            }
            ApiError::Upstream { message, cause } => {
                tracing::warn!("{}: {}", message, cause);
                Envelope::errors(json!(cause), StatusCode::BAD_REQUEST, message).into_response()
            }
            ApiError::Unauthorized(detail) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response()
            }
            ApiError::InvalidPage => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Invalid page." })),
            )
                .into_response(),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                Envelope::errors(
                    json!("A database error occurred"),
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred",
                )
                .into_response()
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                Envelope::errors(
                    json!("An internal error occurred"),
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred",
                )
                .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<RatingError> for ApiError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl ApiError {
    pub fn upstream(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        ApiError::Upstream {
            message: message.into(),
            cause: cause.to_string(),
        }
    }

    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upstream_error_is_400_envelope() {
        let response = ApiError::upstream("Error fetching movie", "404 Not Found").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "errors": "404 Not Found",
                "status": 400,
                "message": "Error fetching movie"
            })
        );
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let response = ApiError::field("rating", "This field is required.").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["errors"]["rating"][0], "This field is required.");
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_invalid_page_and_unauthorized_use_detail() {
        let response = ApiError::InvalidPage.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["detail"], "Invalid page.");

        let response = ApiError::Unauthorized(NOT_AUTHENTICATED.to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["detail"], NOT_AUTHENTICATED);
    }

    #[test]
    fn test_display() {
        let err = ApiError::field("movie_id", "A valid integer is required.");
        assert_eq!(
            err.to_string(),
            "Validation error: movie_id: A valid integer is required."
        );
    }
}
