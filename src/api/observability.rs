use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, field, info, info_span};
use uuid::Uuid;

use crate::api::AppState;
use crate::cache::CacheStatus;

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Cache label for a response. Routes that never consult the cache report `none`.
pub fn cache_label(response: &Response) -> &'static str {
    response
        .extensions()
        .get::<CacheStatus>()
        .map_or("none", |status| status.as_str())
}

/// Runs each routed request inside a `request` span.
///
/// Handlers that read through the response cache attach a [`CacheStatus`]
/// extension, and the TMDB client records `upstream` on the span when it is
/// called, so one log line per request says whether TMDB was hit and how it
/// went. `http_requests_total` is labelled by route template and cache outcome.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let route = req.extensions().get::<MatchedPath>().map_or_else(
        || req.uri().path().to_string(),
        |matched| matched.as_str().to_string(),
    );

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        %method,
        %route,
        user_id = field::Empty,
        cache = field::Empty,
        upstream = field::Empty,
    );

    let response = next.run(req).instrument(span.clone()).await;

    let elapsed = start.elapsed();
    let status = response.status();
    let cache = cache_label(&response);
    span.record("cache", cache);

    let labels = [
        ("method", method.to_string()),
        ("route", route),
        ("status", status.as_str().to_string()),
        ("cache", cache.to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels[..2])
        .record(elapsed.as_secs_f64());

    span.in_scope(|| {
        info!(
            status = status.as_u16(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Request finished"
        );
    });

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Extension, body::Body, http::StatusCode};

    #[test]
    fn test_cache_label_reads_response_extension() {
        let hit = (Extension(CacheStatus::Hit), StatusCode::OK).into_response();
        assert_eq!(cache_label(&hit), "hit");

        let miss = (Extension(CacheStatus::Miss), StatusCode::OK).into_response();
        assert_eq!(cache_label(&miss), "miss");

        let plain = Response::new(Body::empty());
        assert_eq!(cache_label(&plain), "none");
    }
}
