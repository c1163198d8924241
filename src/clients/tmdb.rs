use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{MovieProvider, UpstreamError};
use crate::config::TmdbConfig;

const API_KEY_PARAM: &str = "api_key";
const LANGUAGE_PARAM: &str = "language";

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: Url,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("ReelRater/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpstreamError::Transport)?;

        Self::with_shared_client(client, config)
    }

    pub fn with_shared_client(client: Client, config: &TmdbConfig) -> Result<Self, UpstreamError> {
        // Url::join drops the last path segment unless the base ends with a slash.
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    /// Builds the request URL for `path`, appending the API key and the
    /// default locale. A caller-supplied `language` takes precedence.
    pub fn build_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, UpstreamError> {
        if let Some((name, _)) = params.iter().find(|(name, _)| *name == API_KEY_PARAM) {
            return Err(UpstreamError::ReservedParameter((*name).to_string()));
        }

        let mut url = self.base_url.join(path.trim_start_matches('/'))?;

        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
            if !params.iter().any(|(name, _)| *name == LANGUAGE_PARAM) {
                pairs.append_pair(LANGUAGE_PARAM, &self.language);
            }
            pairs.append_pair(API_KEY_PARAM, &self.api_key);
        }

        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl MovieProvider for TmdbClient {
    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<Value, UpstreamError> {
        let url = self.build_url(path, params)?;

        debug!(path, "Requesting TMDB");

        let result = self.get_json(url).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("upstream_requests_total", "outcome" => outcome).increment(1);
        // No-op unless the enclosing request span declared the field.
        tracing::Span::current().record("upstream", outcome);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> TmdbClient {
        let config = TmdbConfig {
            base_url: base_url.to_string(),
            api_key: "k3y".to_string(),
            ..TmdbConfig::default()
        };
        TmdbClient::new(&config).unwrap()
    }

    #[test]
    fn test_build_url_injects_key_and_locale() {
        let url = client("https://api.themoviedb.org/3/")
            .build_url("movie/popular", &[("page", "1".to_string())])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/movie/popular?page=1&language=en-US&api_key=k3y"
        );
    }

    #[test]
    fn test_build_url_without_trailing_slash() {
        let url = client("https://api.themoviedb.org/3")
            .build_url("/movie/20", &[])
            .unwrap();

        assert_eq!(url.path(), "/3/movie/20");
    }

    #[test]
    fn test_caller_language_wins() {
        let url = client("https://api.themoviedb.org/3/")
            .build_url("discover/movie", &[("language", "fr".to_string())])
            .unwrap();

        let languages: Vec<_> = url
            .query_pairs()
            .filter(|(k, _)| k == "language")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(languages, vec!["fr".to_string()]);
    }

    #[test]
    fn test_api_key_param_rejected() {
        let err = client("https://api.themoviedb.org/3/")
            .build_url("movie/popular", &[("api_key", "other".to_string())])
            .unwrap_err();

        assert!(matches!(err, UpstreamError::ReservedParameter(p) if p == "api_key"));
    }

    #[test]
    fn test_genres_are_encoded() {
        let url = client("https://api.themoviedb.org/3/")
            .build_url("discover/movie", &[("with_genres", "28,12".to_string())])
            .unwrap();

        assert!(url.as_str().contains("with_genres=28%2C12"));
    }
}
