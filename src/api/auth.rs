use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::error::{INVALID_API_KEY, NOT_AUTHENTICATED};
use super::{ApiError, AppState};

/// Authentication middleware that accepts either:
/// 1. `X-Api-Key` header
/// 2. `Authorization: Bearer <api_key>` header
///
/// Rejected requests never reach the handler, so no cache or upstream
/// access happens for them.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(key) = extract_api_key(&headers) else {
        return Err(ApiError::Unauthorized(NOT_AUTHENTICATED.to_string()));
    };

    match state.store().verify_api_key(&key).await {
        Ok(Some(user)) => {
            tracing::Span::current().record("user_id", &user.username);
            Ok(next.run(request).await)
        }
        Ok(None) => Err(ApiError::Unauthorized(INVALID_API_KEY.to_string())),
        Err(e) => {
            tracing::warn!(error = %e, "API key lookup failed");
            Err(ApiError::Unauthorized(INVALID_API_KEY.to_string()))
        }
    }
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_api_key(&headers), None);

        headers.insert("Authorization", "Bearer abc ".parse().unwrap());
        assert_eq!(extract_api_key(&headers).as_deref(), Some("abc"));

        headers.insert("X-Api-Key", "xyz".parse().unwrap());
        assert_eq!(extract_api_key(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_other_schemes_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(extract_api_key(&headers), None);
    }
}
