//! Best-effort article excerpts.
//!
//! The [`Enricher`] visits each article's page through an [`Extractor`] and
//! stores a short excerpt in `summary`. It never fails: extraction errors are
//! written into `summary` as a marker starting with
//! [`SUMMARY_FAILURE_PREFIX`](crate::models::SUMMARY_FAILURE_PREFIX).
//!
//! # Extraction Rules
//!
//! Pages on a known site (Naver news by default) use the site's conventions:
//! a long enough `og:description`, else the article body container with
//! markup stripped. Other pages use the meta description or their paragraph
//! text. Excerpts are cut at [`SUMMARY_LENGTH`] characters.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::error::{DigestError, Result};
use crate::models::{Article, failure_summary};
use crate::scrapers::{get_text, meta_content};
use crate::utils::{collapse_whitespace, strip_tags, truncate_chars, truncate_for_log};

/// Maximum excerpt length in characters, before the ellipsis.
pub const SUMMARY_LENGTH: usize = 300;

/// Default pause between successive page fetches.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// A site-specific `og:description` shorter than this is treated as boilerplate.
const MIN_DESCRIPTION_CHARS: usize = 50;

/// A site-specific body shorter than this is treated as a failed match.
const MIN_BODY_CHARS: usize = 100;

static NAVER_BODY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?s)<article[^>]*id="dic_area"[^>]*>(.*?)</article>"#,
        r#"(?s)<div[^>]*class="[^"]*newsct_article[^"]*"[^>]*>(.*?)</div>"#,
        r#"(?s)<div[^>]*id="_article_body"[^>]*>(.*?)</div>"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid body regex"))
    .collect()
});

/// Produces a plain-text excerpt for an article URL.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String>;
}

/// Article-page conventions for one site.
#[derive(Debug, Clone)]
pub struct SiteRule {
    host_fragment: String,
    body_patterns: Vec<Regex>,
}

impl SiteRule {
    /// `host_fragment` is matched as a substring of the article URL. Each body
    /// pattern needs one capture group around the article markup.
    pub fn new(host_fragment: impl Into<String>, body_patterns: Vec<Regex>) -> Self {
        Self {
            host_fragment: host_fragment.into(),
            body_patterns,
        }
    }

    pub fn naver() -> Self {
        Self::new("naver.com", NAVER_BODY_PATTERNS.clone())
    }

    fn matches(&self, url: &str) -> bool {
        url.contains(&self.host_fragment)
    }

    fn extract(&self, html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        if let Some(description) = meta_content(&document, "og:description") {
            if description.chars().count() > MIN_DESCRIPTION_CHARS {
                return Ok(description);
            }
        }

        self.body_patterns
            .iter()
            .filter_map(|re| re.captures(html))
            .filter_map(|caps| caps.get(1))
            .map(|m| strip_tags(m.as_str()))
            .find(|text| text.chars().count() > MIN_BODY_CHARS)
            .map(|text| truncate_chars(&text, SUMMARY_LENGTH))
            .ok_or_else(|| DigestError::extraction("no article body"))
    }
}

/// Fetches article pages over HTTP and extracts an excerpt.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    client: Client,
    rules: Vec<SiteRule>,
    timeout: Duration,
}

impl PageExtractor {
    /// Extractor with the built-in site rules.
    pub fn new(client: Client) -> Self {
        Self::with_rules(client, vec![SiteRule::naver()])
    }

    pub fn with_rules(client: Client, rules: Vec<SiteRule>) -> Self {
        Self {
            client,
            rules,
            timeout: PAGE_TIMEOUT,
        }
    }

    /// Excerpt from already-fetched page markup.
    pub fn extract_from_html(&self, url: &str, html: &str) -> Result<String> {
        match self.rules.iter().find(|rule| rule.matches(url)) {
            Some(rule) => rule.extract(html),
            None => generic_excerpt(html),
        }
    }
}

#[async_trait]
impl Extractor for PageExtractor {
    #[instrument(level = "debug", skip(self))]
    async fn extract(&self, url: &str) -> Result<String> {
        let html = get_text(&self.client, url, self.timeout).await?;
        self.extract_from_html(url, &html)
    }
}

/// Meta description, else paragraph text, for pages without a site rule.
fn generic_excerpt(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    if let Some(description) = meta_content(&document, "og:description")
        .or_else(|| meta_content(&document, "description"))
    {
        return Ok(truncate_chars(&description, SUMMARY_LENGTH));
    }

    let text = ["article p", "p"]
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .map(|selector| {
            let parts: Vec<String> = document
                .select(&selector)
                .map(|el| el.text().collect::<String>())
                .collect();
            collapse_whitespace(&parts.join(" "))
        })
        .find(|text| !text.is_empty())
        .ok_or_else(|| DigestError::extraction("no paragraph text"))?;

    Ok(truncate_chars(&text, SUMMARY_LENGTH))
}

/// Fills in article summaries, one page at a time.
pub struct Enricher {
    extractor: Box<dyn Extractor>,
    delay: Duration,
}

impl Enricher {
    pub fn new(extractor: Box<dyn Extractor>) -> Self {
        Self {
            extractor,
            delay: DEFAULT_DELAY,
        }
    }

    /// Override the pause between page fetches.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set `summary` on every article and return the same list.
    ///
    /// Failures never propagate: a failed article gets a marker summary and
    /// the loop moves on. The pause is skipped after the last article.
    #[instrument(level = "info", skip_all, fields(total = articles.len()))]
    pub async fn enrich(&self, mut articles: Vec<Article>) -> Vec<Article> {
        let total = articles.len();

        for (i, article) in articles.iter_mut().enumerate() {
            article.summary = match self.extractor.extract(&article.link).await {
                Ok(summary) => summary,
                Err(e) => failure_summary(&truncate_chars(&e.to_string(), 30)),
            };
            debug!(
                index = i + 1,
                total,
                failed = article.summary_failed(),
                summary = %truncate_for_log(&article.summary, 80),
                "Summarized article"
            );

            if i + 1 < total {
                sleep(self.delay).await;
            }
        }

        let succeeded = articles.iter().filter(|a| a.has_summary()).count();
        info!(succeeded, total, "Summaries finished");
        articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::http_client;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysFails {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Extractor for AlwaysFails {
        async fn extract(&self, _url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DigestError::extraction("connection reset"))
        }
    }

    struct Echo;

    #[async_trait]
    impl Extractor for Echo {
        async fn extract(&self, url: &str) -> Result<String> {
            if url.ends_with("/bad") {
                Err(DigestError::extraction("nope"))
            } else {
                Ok(format!("excerpt of {url}"))
            }
        }
    }

    fn articles(links: &[&str]) -> Vec<Article> {
        links
            .iter()
            .map(|l| Article::new(format!("title {l}"), *l, "2025-01-06", "Src"))
            .collect()
    }

    #[tokio::test]
    async fn test_enrich_never_fails() {
        let enricher = Enricher::new(Box::new(AlwaysFails {
            calls: AtomicUsize::new(0),
        }))
        .with_delay(Duration::ZERO);

        let input = articles(&["https://a/1", "https://a/2", "https://a/3"]);
        let output = enricher.enrich(input.clone()).await;

        assert_eq!(output.len(), input.len());
        assert!(output.iter().all(|a| a.summary_failed()));
        assert!(output.iter().all(|a| a.summary.starts_with("(summary unavailable")));
        for (before, after) in input.iter().zip(&output) {
            assert_eq!(before.link, after.link);
            assert_eq!(before.title, after.title);
        }
    }

    #[tokio::test]
    async fn test_enrich_mixes_success_and_failure() {
        let enricher = Enricher::new(Box::new(Echo)).with_delay(Duration::ZERO);

        let output = enricher.enrich(articles(&["https://a/ok", "https://a/bad"])).await;

        assert_eq!(output[0].summary, "excerpt of https://a/ok");
        assert!(output[1].summary_failed());
    }

    #[tokio::test]
    async fn test_parenthesized_excerpt_counts_as_success() {
        struct WireCredit;

        #[async_trait]
        impl Extractor for WireCredit {
            async fn extract(&self, _url: &str) -> Result<String> {
                Ok("(서울=연합뉴스) 김기자 = 정부는 반도체 지원책을 발표했다.".to_string())
            }
        }

        let enricher = Enricher::new(Box::new(WireCredit)).with_delay(Duration::ZERO);
        let output = enricher.enrich(articles(&["https://a/1"])).await;

        assert!(output[0].summary.starts_with("(서울=연합뉴스)"));
        assert!(!output[0].summary_failed());
        assert!(output[0].has_summary());
    }

    #[tokio::test]
    async fn test_enrich_empty_list() {
        let enricher = Enricher::new(Box::new(Echo));
        assert!(enricher.enrich(Vec::new()).await.is_empty());
    }

    #[test]
    fn test_site_rule_prefers_long_description() {
        let rule = SiteRule::naver();
        let description = "d".repeat(60);
        let html = format!(
            r#"<html><head><meta property="og:description" content="{description}"></head>
            <body><article id="dic_area">{}</article></body></html>"#,
            "body ".repeat(50)
        );
        assert_eq!(rule.extract(&html).unwrap(), description);
    }

    #[test]
    fn test_site_rule_falls_back_to_body_and_truncates() {
        let rule = SiteRule::naver();
        let body = "word ".repeat(100);
        let html = format!(
            r#"<html><head><meta property="og:description" content="short"></head>
            <body><article class="x" id="dic_area"><p>{body}</p><br/></article></body></html>"#
        );
        let summary = rule.extract(&html).unwrap();
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), SUMMARY_LENGTH + 3);
        assert!(summary.starts_with("word word"));
    }

    #[test]
    fn test_site_rule_short_body_fails() {
        let rule = SiteRule::naver();
        let html = r#"<div id="_article_body">too short</div>"#;
        assert!(rule.extract(html).is_err());
    }

    #[test]
    fn test_generic_excerpt_uses_meta_then_paragraphs() {
        let with_meta = r#"<html><head><meta name="description" content="Meta text"></head></html>"#;
        assert_eq!(generic_excerpt(with_meta).unwrap(), "Meta text");

        let with_paragraphs = r#"<html><body><p>First  part.</p><div><p>Second
            part.</p></div></body></html>"#;
        assert_eq!(generic_excerpt(with_paragraphs).unwrap(), "First part. Second part.");

        assert!(generic_excerpt("<html><body><div>nothing</div></body></html>").is_err());
    }

    #[test]
    fn test_extract_from_html_picks_rule_by_url() {
        let extractor = PageExtractor::new(http_client().unwrap());
        let html = r#"<html><head><meta name="description" content="Meta text"></head></html>"#;
        assert_eq!(
            extractor.extract_from_html("https://example.com/a", html).unwrap(),
            "Meta text"
        );
        assert!(
            extractor
                .extract_from_html("https://n.news.naver.com/mnews/article/1", html)
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_page_extractor_end_to_end() {
        let server = MockServer::start();
        let ok = server.mock(|when, then| {
            when.method(GET).path("/story");
            then.status(200).body(format!(
                r#"<html><head><meta property="og:description" content="{}"></head></html>"#,
                "Long description of the story. ".repeat(3)
            ));
        });
        server.mock(|when, then| {
            when.method(GET).path("/gone");
            then.status(404);
        });

        let extractor = PageExtractor::with_rules(
            http_client().unwrap(),
            vec![SiteRule::new("127.0.0.1", NAVER_BODY_PATTERNS.clone())],
        );
        let enricher = Enricher::new(Box::new(extractor)).with_delay(Duration::ZERO);
        let output = enricher
            .enrich(vec![
                Article::new("A", server.url("/story"), "", "Src"),
                Article::new("B", server.url("/gone"), "", "Src"),
            ])
            .await;

        ok.assert();
        assert!(output[0].summary.starts_with("Long description of the story."));
        assert!(output[1].summary_failed());
    }
}
