use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Discovery filter submitted by the caller. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationQuery {
    pub genres: Vec<String>,
    pub language: String,
    pub release_year: Option<i64>,
}

impl Default for RecommendationQuery {
    fn default() -> Self {
        Self {
            genres: Vec::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            release_year: None,
        }
    }
}

impl RecommendationQuery {
    /// Query parameters for `discover/movie`.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("with_genres", self.genres.join(",")),
            ("language", self.language.clone()),
        ];
        if let Some(year) = self.release_year {
            params.push(("primary_release_year", year.to_string()));
        }
        params
    }
}

/// One entry of a `discover/movie` result list as the provider returns it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiscoverResult {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DiscoverResponse {
    pub results: Vec<DiscoverResult>,
}

/// Reshaped recommendation returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieSummary {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
}

impl From<DiscoverResult> for MovieSummary {
    fn from(result: DiscoverResult) -> Self {
        Self {
            title: result.title,
            description: result.overview,
            release_date: result.release_date,
            poster_path: result.poster_path,
        }
    }
}
