pub mod tmdb;

use serde_json::Value;
use thiserror::Error;

pub use tmdb::TmdbClient;

/// Failure talking to the upstream metadata provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("query parameter '{0}' is injected by the client and must not be passed in")]
    ReservedParameter(String),
}

/// Read access to the movie metadata provider.
///
/// `fetch` performs a single GET with no retries; the client is responsible
/// for adding credentials and locale.
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<Value, UpstreamError>;
}
