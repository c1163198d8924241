use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// Uniform JSON body: `{data?, errors?, status?, message?}`.
///
/// Absent fields are omitted rather than serialized as `null`. The HTTP
/// status mirrors `status` and falls back to 200.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn envelope<T>(
    data: Option<T>,
    errors: Option<Value>,
    status: Option<StatusCode>,
    message: Option<&str>,
) -> Envelope<T> {
    Envelope {
        data,
        errors,
        status: status.map(|s| s.as_u16()),
        message: message.map(str::to_string),
    }
}

impl<T> Envelope<T> {
    pub const fn data(data: T) -> Self {
        Self {
            data: Some(data),
            errors: None,
            status: None,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }
}

impl Envelope<()> {
    pub const fn empty() -> Self {
        Self {
            data: None,
            errors: None,
            status: None,
            message: None,
        }
    }

    pub fn errors(errors: Value, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
            status: Some(status.as_u16()),
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = self
            .status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::OK);

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_present_fields_serialized() {
        let body = envelope(Some(json!({"id": 20})), None, None, Some("ok"));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"data": {"id": 20}, "message": "ok"})
        );

        let empty = envelope::<()>(None, None, None, None);
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({}));
    }

    #[test]
    fn test_status_defaults_to_ok() {
        let response = Envelope::data(vec![1, 2]).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_status_drives_http_code() {
        let created = Envelope::empty()
            .with_status(StatusCode::CREATED)
            .with_message("Rating saved successfully!");
        assert_eq!(
            serde_json::to_value(&created).unwrap(),
            json!({"status": 201, "message": "Rating saved successfully!"})
        );
        assert_eq!(created.into_response().status(), StatusCode::CREATED);

        let failed = Envelope::errors(json!("boom"), StatusCode::BAD_REQUEST, "Error fetching movie");
        assert_eq!(failed.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
