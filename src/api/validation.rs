use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use std::collections::BTreeMap;

use super::ApiError;
use crate::models::movie::RecommendationQuery;
use crate::models::rating::NewRating;

/// Field name to error messages. Body-level problems go under `non_field_errors`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const NON_FIELD_ERRORS: &str = "non_field_errors";
const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const INVALID_INTEGER: &str = "A valid integer is required.";
const INVALID_NUMBER: &str = "A valid number is required.";
const INVALID_STRING: &str = "Not a valid string.";

/// JSON object body deserialized into `T`.
///
/// A malformed body, or one that is not an object, is a 400 validation error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::field(
                    NON_FIELD_ERRORS,
                    format!("JSON parse error - {}", rejection.body_text()),
                )
            })?;

        require_object(&value).map_err(ApiError::Validation)?;

        serde_json::from_value(value)
            .map(Self)
            .map_err(|e| ApiError::field(NON_FIELD_ERRORS, format!("Invalid data - {e}")))
    }
}

/// Distinguishes an explicit `null` (`Some(Value::Null)`) from a missing key (`None`).
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Body of `POST /api/ratings/`. Fields are checked by [`RatingRequest::validate`]
/// so every problem is reported at once.
#[derive(Debug, Default, Deserialize)]
pub struct RatingRequest {
    #[serde(default, deserialize_with = "present")]
    pub movie_id: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Value>,
}

impl RatingRequest {
    pub fn validate(self) -> Result<NewRating, FieldErrors> {
        let mut errors = FieldErrors::new();

        let movie_id = required(self.movie_id, "movie_id", &mut errors, integer_field);
        let rating = required(self.rating, "rating", &mut errors, number_field);

        match (movie_id, rating) {
            (Some(movie_id), Some(rating)) if errors.is_empty() => {
                Ok(NewRating { movie_id, rating })
            }
            _ => Err(errors),
        }
    }
}

/// Body of `POST /api/recommendations/`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default, deserialize_with = "present")]
    pub genres: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub language: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub release_year: Option<Value>,
}

impl RecommendationRequest {
    pub fn validate(self) -> Result<RecommendationQuery, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut query = RecommendationQuery::default();

        if let Some(genres) = optional(self.genres, "genres", &mut errors, genres_field) {
            query.genres = genres;
        }
        if let Some(language) = optional(self.language, "language", &mut errors, string_field) {
            query.language = language;
        }
        query.release_year =
            optional(self.release_year, "release_year", &mut errors, integer_field);

        if errors.is_empty() {
            Ok(query)
        } else {
            Err(errors)
        }
    }
}

/// Positive integer from the `{id}` path segment.
pub fn validate_movie_id(raw: &str) -> Result<i64, ApiError> {
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::field("id", INVALID_INTEGER))?;

    if id <= 0 {
        return Err(ApiError::field(
            "id",
            "Ensure this value is greater than or equal to 1.",
        ));
    }
    Ok(id)
}

fn require_object(body: &Value) -> Result<(), FieldErrors> {
    if body.is_object() {
        return Ok(());
    }
    let mut errors = FieldErrors::new();
    errors.insert(
        NON_FIELD_ERRORS.to_string(),
        vec![format!(
            "Invalid data. Expected a dictionary, but got {}.",
            type_name(body)
        )],
    );
    Err(errors)
}

fn required<T>(
    value: Option<Value>,
    name: &str,
    errors: &mut FieldErrors,
    parse: fn(&Value) -> Result<T, String>,
) -> Option<T> {
    let Some(value) = value else {
        errors.insert(name.to_string(), vec![REQUIRED.to_string()]);
        return None;
    };
    checked(&value, name, errors, parse)
}

fn optional<T>(
    value: Option<Value>,
    name: &str,
    errors: &mut FieldErrors,
    parse: fn(&Value) -> Result<T, String>,
) -> Option<T> {
    value.and_then(|value| checked(&value, name, errors, parse))
}

fn checked<T>(
    value: &Value,
    name: &str,
    errors: &mut FieldErrors,
    parse: fn(&Value) -> Result<T, String>,
) -> Option<T> {
    let result = if value.is_null() {
        Err(NOT_NULL.to_string())
    } else {
        parse(value)
    };

    match result {
        Ok(parsed) => Some(parsed),
        Err(message) => {
            errors.entry(name.to_string()).or_default().push(message);
            None
        }
    }
}

/// Integers, integral floats and numeric strings are accepted.
fn integer_field(value: &Value) -> Result<i64, String> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| INVALID_INTEGER.to_string())
}

fn number_field(value: &Value) -> Result<f64, String> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| INVALID_NUMBER.to_string())
}

fn string_field(value: &Value) -> Result<String, String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(INVALID_STRING.to_string()),
    };
    if text.is_empty() {
        return Err(NOT_BLANK.to_string());
    }
    Ok(text)
}

fn genres_field(value: &Value) -> Result<Vec<String>, String> {
    let Value::Array(items) = value else {
        return Err(format!(
            "Expected a list of items but got type \"{}\".",
            type_name(value)
        ));
    };

    items
        .iter()
        .map(|item| {
            if item.is_null() {
                Err(NOT_NULL.to_string())
            } else {
                string_field(item)
            }
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
