//! Page-number pagination over an in-memory list.
//!
//! Links are absolute and keep every other query parameter of the request.
//! The link back to page 1 drops `page` entirely.

use axum::http::{HeaderMap, Uri, header};
use serde::{Deserialize, Serialize};
use url::Url;

use super::ApiError;

pub const PAGE_SIZE: usize = 10;

const PAGE_PARAM: &str = "page";
const LAST_PAGE: &str = "last";

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Absolute URL of the current request, from the `Host` header and the
/// original (un-nested) URI.
pub fn request_url(headers: &HeaderMap, uri: &Uri) -> Result<Url, ApiError> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(axum::http::uri::Authority::as_str))
        .unwrap_or("localhost");

    let path_and_query = uri
        .path_and_query()
        .map_or("/", axum::http::uri::PathAndQuery::as_str);

    Url::parse(&format!("http://{host}{path_and_query}"))
        .map_err(|e| ApiError::internal(format!("Cannot build page links: {e}")))
}

/// Resolves the requested page number. An empty or missing value means page 1.
fn page_number(requested: Option<&str>, num_pages: usize) -> Result<usize, ApiError> {
    let requested = requested.map(str::trim).filter(|p| !p.is_empty());

    let number = match requested {
        None => 1,
        Some(LAST_PAGE) => num_pages,
        Some(raw) => raw.parse::<usize>().map_err(|_| ApiError::InvalidPage)?,
    };

    if number == 0 || number > num_pages {
        return Err(ApiError::InvalidPage);
    }
    Ok(number)
}

fn page_link(base: &Url, page: usize) -> String {
    let mut url = base.clone();
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(name, _)| name != PAGE_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    if !kept.is_empty() || page > 1 {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in &kept {
            pairs.append_pair(name, value);
        }
        if page > 1 {
            pairs.append_pair(PAGE_PARAM, &page.to_string());
        }
    }

    url.to_string()
}

pub fn paginate<T>(
    items: Vec<T>,
    requested: Option<&str>,
    base: &Url,
) -> Result<Paginated<T>, ApiError> {
    let count = items.len();
    let num_pages = count.div_ceil(PAGE_SIZE).max(1);
    let page = page_number(requested, num_pages)?;

    let results = items
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    Ok(Paginated {
        count,
        next: (page < num_pages).then(|| page_link(base, page + 1)),
        previous: (page > 1).then(|| page_link(base, page - 1)),
        results,
    })
}
