//! Search portal scraper.
//!
//! Submits a keyword to a portal's news search page, pulls article links out
//! of the returned markup with a regex, then visits each article to read its
//! title and byline from Open Graph meta tags.
//!
//! # URL Patterns
//!
//! | Portal | Search page | Article links |
//! |--------|-------------|---------------|
//! | Naver | `search.naver.com/search.naver?where=news&query=…&sort=1` | `https://n.news.naver.com/mnews/article/…` |
//! | Daum | `search.daum.net/search?w=news&q=…&sort=recency` | `https://v.daum.net/v/…` |

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{Source, document_title, get_text, meta_content};
use crate::error::Result;
use crate::models::{Article, today, validate_link};

/// Placeholder title for pages without `og:title` or `<title>`.
pub const UNTITLED: &str = "(untitled)";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const ARTICLE_TIMEOUT: Duration = Duration::from_secs(5);

static NAVER_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="(https://n\.news\.naver\.com/mnews/article/[^"]+)""#)
        .expect("valid Naver link regex")
});

static DAUM_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="(https://v\.daum\.net/v/[^"]+)""#).expect("valid Daum link regex")
});

/// A news search page that links to individual article pages.
///
/// `search_url` contains a `{query}` placeholder that is replaced with the
/// percent-encoded keyword. `link_pattern` must have one capture group that
/// yields an absolute article URL.
#[derive(Debug, Clone)]
pub struct SearchPortal {
    name: String,
    search_url: String,
    link_pattern: Regex,
    client: Client,
    search_timeout: Duration,
    article_timeout: Duration,
}

impl SearchPortal {
    pub fn new(
        name: impl Into<String>,
        search_url: impl Into<String>,
        link_pattern: Regex,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            search_url: search_url.into(),
            link_pattern,
            client,
            search_timeout: SEARCH_TIMEOUT,
            article_timeout: ARTICLE_TIMEOUT,
        }
    }

    /// Naver news search, newest first.
    pub fn naver(client: Client) -> Self {
        Self::new(
            "네이버뉴스",
            "https://search.naver.com/search.naver?where=news&query={query}&sort=1",
            NAVER_LINK_RE.clone(),
            client,
        )
    }

    /// Daum news search, newest first.
    pub fn daum(client: Client) -> Self {
        Self::new(
            "다음뉴스",
            "https://search.daum.net/search?w=news&q={query}&sort=recency",
            DAUM_LINK_RE.clone(),
            client,
        )
    }

    /// Search page URL for `query`.
    pub fn search_url_for(&self, query: &str) -> String {
        self.search_url
            .replace("{query}", &urlencoding::encode(query))
    }

    /// Article links found in a search page, de-duplicated in first-seen order.
    pub fn candidate_links(&self, html: &str) -> Vec<String> {
        self.link_pattern
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unique()
            .collect()
    }

    /// Fetch one article page and read its metadata.
    #[instrument(level = "debug", skip(self))]
    async fn fetch_article(&self, link: &str) -> Result<Article> {
        validate_link(link)?;
        let body = get_text(&self.client, link, self.article_timeout).await?;
        let (title, source) = self.read_metadata(&body);
        Ok(Article::new(title, link, today(), source))
    }

    /// Title and byline from an article page, with portal-level fallbacks.
    fn read_metadata(&self, body: &str) -> (String, String) {
        let document = Html::parse_document(body);
        let title = meta_content(&document, "og:title")
            .or_else(|| document_title(&document))
            .unwrap_or_else(|| UNTITLED.to_string());
        let source = meta_content(&document, "og:article:author").unwrap_or_else(|| self.name.clone());
        (title, source)
    }
}

#[async_trait]
impl Source for SearchPortal {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "info", skip(self), fields(source = %self.name))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        let url = self.search_url_for(query);
        let html = get_text(&self.client, &url, self.search_timeout).await?;
        let links = self.candidate_links(&html);
        debug!(candidates = links.len(), "Extracted article links");

        let articles: Vec<Article> = stream::iter(links)
            .then(|link: String| async move {
                match self.fetch_article(&link).await {
                    Ok(article) => Some(article),
                    Err(e) => {
                        debug!(%link, error = %e, "Skipping article page");
                        None
                    }
                }
            })
            .filter_map(std::future::ready)
            .take(limit)
            .collect()
            .await;

        info!(count = articles.len(), "Collected portal articles");
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::http_client;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    fn mock_portal(server: &MockServer) -> SearchPortal {
        let pattern = format!(r#"href="({}/article/[^"]+)""#, regex::escape(&server.base_url()));
        SearchPortal::new(
            "Mock Portal",
            server.url("/search?q={query}"),
            Regex::new(&pattern).unwrap(),
            http_client().unwrap(),
        )
    }

    fn article_page(title: &str, author: Option<&str>) -> String {
        let author = author
            .map(|a| format!(r#"<meta property="og:article:author" content="{a}">"#))
            .unwrap_or_default();
        format!(
            r#"<html><head><meta property="og:title" content="{title}">{author}</head><body></body></html>"#
        )
    }

    #[test]
    fn test_search_url_encodes_query() {
        let portal = SearchPortal::naver(http_client().unwrap());
        assert_eq!(
            portal.search_url_for("인공지능 AI"),
            "https://search.naver.com/search.naver?where=news&query=%EC%9D%B8%EA%B3%B5%EC%A7%80%EB%8A%A5%20AI&sort=1"
        );
    }

    #[test]
    fn test_candidate_links_unique_in_order() {
        let portal = SearchPortal::naver(http_client().unwrap());
        let html = r#"
            <a href="https://n.news.naver.com/mnews/article/001/0002">b</a>
            <a href="https://n.news.naver.com/mnews/article/001/0001">a</a>
            <a href="https://n.news.naver.com/mnews/article/001/0002">b again</a>
            <a href="https://news.example.com/other">skip</a>
        "#;
        assert_eq!(
            portal.candidate_links(html),
            vec![
                "https://n.news.naver.com/mnews/article/001/0002".to_string(),
                "https://n.news.naver.com/mnews/article/001/0001".to_string(),
            ]
        );
    }

    #[test]
    fn test_daum_links() {
        let portal = SearchPortal::daum(http_client().unwrap());
        let html = r#"<a href="https://v.daum.net/v/20250101000000001">x</a>"#;
        assert_eq!(
            portal.candidate_links(html),
            vec!["https://v.daum.net/v/20250101000000001".to_string()]
        );
    }

    #[test]
    fn test_read_metadata_fallbacks() {
        let portal = SearchPortal::daum(http_client().unwrap());
        let (title, source) = portal.read_metadata("<html><head><title>Fallback</title></head></html>");
        assert_eq!(title, "Fallback");
        assert_eq!(source, "다음뉴스");

        let (title, _) = portal.read_metadata("<html></html>");
        assert_eq!(title, UNTITLED);
    }

    #[tokio::test]
    async fn test_search_collects_metadata_and_skips_failures() {
        let server = MockServer::start();
        let base = server.base_url();
        let search = server.mock(|when, then| {
            when.method(GET).path("/search").query_param("q", "ai");
            then.status(200).body(format!(
                r#"<a href="{base}/article/1">1</a><a href="{base}/article/2">2</a><a href="{base}/article/3">3</a>"#
            ));
        });
        let first = server.mock(|when, then| {
            when.method(GET).path("/article/1");
            then.status(200).body(article_page("First story", Some("Daily Paper")));
        });
        let broken = server.mock(|when, then| {
            when.method(GET).path("/article/2");
            then.status(500);
        });
        let third = server.mock(|when, then| {
            when.method(GET).path("/article/3");
            then.status(200).body(article_page("Third story", None));
        });

        let articles = mock_portal(&server).search("ai", 10).await.unwrap();

        search.assert();
        first.assert();
        broken.assert();
        third.assert();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "First story");
        assert_eq!(articles[0].source, "Daily Paper");
        assert_eq!(articles[0].link, format!("{base}/article/1"));
        assert_eq!(articles[0].published, today());
        assert_eq!(articles[1].title, "Third story");
        assert_eq!(articles[1].source, "Mock Portal");
        assert!(articles.iter().all(|a| a.summary.is_empty()));
    }

    #[tokio::test]
    async fn test_search_stops_at_limit() {
        let server = MockServer::start();
        let base = server.base_url();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(200).body(format!(
                r#"<a href="{base}/article/1">1</a><a href="{base}/article/2">2</a>"#
            ));
        });
        server.mock(|when, then| {
            when.method(GET).path("/article/1");
            then.status(200).body(article_page("One", None));
        });
        let second = server.mock(|when, then| {
            when.method(GET).path("/article/2");
            then.status(200).body(article_page("Two", None));
        });

        let articles = mock_portal(&server).search("ai", 1).await.unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "One");
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_degrades_when_search_page_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(503);
        });

        let portal = mock_portal(&server);
        assert!(portal.search("ai", 5).await.is_err());
        assert!(portal.fetch("ai", 5).await.is_empty());
    }
}
