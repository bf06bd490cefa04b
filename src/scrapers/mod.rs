//! News source adapters.
//!
//! Every adapter implements [`Source`]: given a keyword and a ceiling it
//! returns normalized [`Article`] records. Adapters are independent strategies
//! so a broken one can be dropped from the list without touching the others.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Naver News | [`search`] | Search page scraping | Primary source, one request per article |
//! | Daum News | [`search`] | Search page scraping | Same flow as Naver with its own link pattern |
//! | Publisher RSS | [`feed`] | RSS/Atom parsing | Keyword filter on title and description |
//! | RSS directory | [`feed`] | RSS/Atom parsing | Walks every feed in [`catalog`] |
//!
//! # Failure Policy
//!
//! [`Source::search`] reports errors. [`Source::fetch`] is what callers use:
//! it logs the error and returns an empty list, so "no results" and "source
//! down" look the same to the aggregator.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{DigestError, Result};
use crate::models::Article;

pub mod catalog;
pub mod feed;
pub mod search;

/// Browser User-Agent sent with every request; portals reject unknown clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Timeout applied when a request does not set its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A strategy that fetches articles for a keyword from one kind of source.
#[async_trait]
pub trait Source: Send + Sync {
    /// Human-readable name used in logs and source listings.
    fn name(&self) -> &str;

    /// Fetch up to `limit` articles matching `query`.
    ///
    /// Implementations may return partial results when individual pages fail,
    /// and an error only when the source as a whole is unusable.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Article>>;

    /// Fetch up to `limit` articles, degrading any failure to an empty list.
    async fn fetch(&self, query: &str, limit: usize) -> Vec<Article> {
        if limit == 0 {
            return Vec::new();
        }
        match self.search(query, limit).await {
            Ok(mut articles) => {
                articles.truncate(limit);
                debug!(source = self.name(), query, count = articles.len(), "Source returned articles");
                articles
            }
            Err(e) => {
                warn!(source = self.name(), query, error = %e, "Source failed; contributing no articles");
                Vec::new()
            }
        }
    }
}

/// Build the shared HTTP client used by every adapter and the enricher.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(DigestError::from)
}

/// GET `url` and return the body as text, failing on non-success statuses.
pub(crate) async fn get_text(client: &Client, url: &str, timeout: Duration) -> Result<String> {
    let response = client.get(url).timeout(timeout).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DigestError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}

/// GET `url` and return the raw body bytes, failing on non-success statuses.
pub(crate) async fn get_bytes(client: &Client, url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let response = client.get(url).timeout(timeout).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DigestError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Read the `content` of the first `<meta>` whose `property` or `name` equals `key`.
///
/// Returns `None` for missing or blank values.
pub(crate) fn meta_content(document: &Html, key: &str) -> Option<String> {
    let css = format!(r#"meta[property="{key}"], meta[name="{key}"]"#);
    let selector = Selector::parse(&css).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Text of the document's `<title>`, trimmed.
pub(crate) fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
