//! Multi-source aggregation and deduplication.
//!
//! The [`Aggregator`] owns an ordered list of [`Source`] adapters and asks
//! them in turn for articles until a keyword's quota is met.
//!
//! # Dedup Keys
//!
//! Two entry points use two different keys, and both are intentional:
//!
//! | Operation | Key | Catches |
//! |-----------|-----|---------|
//! | [`Aggregator::collect`] | normalized title | the same story behind different tracking URLs |
//! | [`Aggregator::collect_for_keywords`] | exact link | the same article found by two keywords |
//!
//! # Ordering
//!
//! Sources run sequentially. Within a keyword, earlier sources' articles come
//! first; across keywords, the first keyword's articles come first.

use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::models::Article;
use crate::scrapers::Source;

/// Drives a fixed-priority chain of sources.
pub struct Aggregator {
    sources: Vec<Box<dyn Source>>,
}

impl Aggregator {
    /// Create an aggregator over `sources`, queried in the given order.
    pub fn new(sources: Vec<Box<dyn Source>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Collect at most `limit` articles for `query`, de-duplicated by title.
    ///
    /// The first source is asked for `limit` articles. Each later source is
    /// asked only for the remaining deficit, and is not called at all once the
    /// quota is met. A failing source contributes nothing.
    ///
    /// # Arguments
    ///
    /// * `query` - Keyword to search for
    /// * `limit` - Maximum number of articles to return
    ///
    /// # Returns
    ///
    /// Articles whose normalized titles are pairwise distinct, in source
    /// priority order.
    #[instrument(level = "info", skip(self))]
    pub async fn collect(&self, query: &str, limit: usize) -> Vec<Article> {
        let mut articles: Vec<Article> = Vec::new();
        let mut seen_titles: HashSet<String> = HashSet::new();

        for source in &self.sources {
            if articles.len() >= limit {
                break;
            }
            let remaining = limit - articles.len();
            let fetched = source.fetch(query, remaining).await;
            let fetched_count = fetched.len();

            let before = articles.len();
            for article in fetched {
                if articles.len() >= limit {
                    break;
                }
                if seen_titles.insert(article.normalized_title()) {
                    articles.push(article);
                }
            }

            info!(
                source = source.name(),
                requested = remaining,
                fetched = fetched_count,
                added = articles.len() - before,
                "Merged source results"
            );
        }

        articles
    }

    /// Collect articles for every keyword, de-duplicated by link.
    ///
    /// Runs [`collect`](Self::collect) once per keyword in input order and
    /// keeps the first occurrence of each link.
    ///
    /// # Arguments
    ///
    /// * `keywords` - Keywords to search for, in priority order
    /// * `limit_per_keyword` - Quota passed to each `collect` call
    #[instrument(level = "info", skip(self))]
    pub async fn collect_for_keywords(
        &self,
        keywords: &[String],
        limit_per_keyword: usize,
    ) -> Vec<Article> {
        let mut articles: Vec<Article> = Vec::new();
        let mut seen_links: HashSet<String> = HashSet::new();

        for keyword in keywords {
            let collected = self.collect(keyword, limit_per_keyword).await;
            let collected_count = collected.len();
            for article in collected {
                if seen_links.insert(article.link.clone()) {
                    articles.push(article);
                } else {
                    debug!(link = %article.link, "Dropping link already collected for an earlier keyword");
                }
            }
            info!(
                keyword = %keyword,
                collected = collected_count,
                total = articles.len(),
                "Keyword collection finished"
            );
        }

        articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DigestError, Result};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Records every requested limit and replays a fixed article list.
    struct FakeSource {
        name: String,
        articles: Vec<Article>,
        fail: bool,
        requests: Arc<Mutex<Vec<(String, usize)>>>,
    }

    impl FakeSource {
        fn new(name: &str, articles: Vec<Article>) -> (Self, Arc<Mutex<Vec<(String, usize)>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let source = Self {
                name: name.to_string(),
                articles,
                fail: false,
                requests: Arc::clone(&requests),
            };
            (source, requests)
        }

        fn failing(name: &str) -> (Self, Arc<Mutex<Vec<(String, usize)>>>) {
            let (mut source, requests) = Self::new(name, Vec::new());
            source.fail = true;
            (source, requests)
        }
    }

    #[async_trait]
    impl Source for FakeSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn search(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
            self.requests.lock().unwrap().push((query.to_string(), limit));
            if self.fail {
                return Err(DigestError::Feed("fake outage".to_string()));
            }
            Ok(self.articles.iter().take(limit).cloned().collect())
        }
    }

    fn article(title: &str, link: &str) -> Article {
        Article::new(title, link, "2025-01-06", "Fake")
    }

    fn numbered(prefix: &str, n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| article(&format!("{prefix} {i}"), &format!("http://{prefix}/{i}")))
            .collect()
    }

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_collect_never_exceeds_limit() {
        let (a, _) = FakeSource::new("a", numbered("a", 3));
        let (b, _) = FakeSource::new("b", numbered("b", 10));
        let aggregator = Aggregator::new(vec![Box::new(a), Box::new(b)]);

        for limit in [0, 1, 3, 5, 20] {
            let articles = aggregator.collect("q", limit).await;
            assert!(articles.len() <= limit, "limit {limit} gave {}", articles.len());
        }
        assert_eq!(aggregator.collect("q", 5).await.len(), 5);
        assert_eq!(aggregator.collect("q", 20).await.len(), 13);
    }

    #[tokio::test]
    async fn test_primary_source_filling_quota_skips_the_rest() {
        let (primary, primary_calls) = FakeSource::new("primary", numbered("p", 5));
        let (secondary, secondary_calls) = FakeSource::new("secondary", numbered("s", 5));
        let aggregator = Aggregator::new(vec![Box::new(primary), Box::new(secondary)]);

        let articles = aggregator.collect("ai", 5).await;

        assert_eq!(articles.len(), 5);
        assert_eq!(*primary_calls.lock().unwrap(), vec![("ai".to_string(), 5)]);
        assert!(secondary_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_later_sources_asked_only_for_deficit() {
        let (primary, _) = FakeSource::new("primary", numbered("p", 2));
        let (secondary, secondary_calls) = FakeSource::new("secondary", numbered("s", 10));
        let (tertiary, tertiary_calls) = FakeSource::new("tertiary", numbered("t", 10));
        let aggregator =
            Aggregator::new(vec![Box::new(primary), Box::new(secondary), Box::new(tertiary)]);

        let articles = aggregator.collect("ai", 5).await;

        assert_eq!(titles(&articles), vec!["p 0", "p 1", "s 0", "s 1", "s 2"]);
        assert_eq!(*secondary_calls.lock().unwrap(), vec![("ai".to_string(), 3)]);
        assert!(tertiary_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_title_dedup_is_case_insensitive() {
        let (a, _) = FakeSource::new("a", vec![article("Foo", "http://a/1")]);
        let (b, _) = FakeSource::new("b", vec![article("foo", "http://a/2")]);
        let aggregator = Aggregator::new(vec![Box::new(a), Box::new(b)]);

        let articles = aggregator.collect("q", 10).await;

        assert_eq!(articles, vec![article("Foo", "http://a/1")]);
    }

    #[tokio::test]
    async fn test_titles_pairwise_distinct_after_trim() {
        let (a, _) = FakeSource::new(
            "a",
            vec![article(" Same ", "http://a/1"), article("SAME", "http://a/2")],
        );
        let (b, _) = FakeSource::new("b", vec![article("same", "http://b/1"), article("Other", "http://b/2")]);
        let aggregator = Aggregator::new(vec![Box::new(a), Box::new(b)]);

        let articles = aggregator.collect("q", 10).await;
        let normalized: HashSet<String> = articles.iter().map(|a| a.normalized_title()).collect();

        assert_eq!(normalized.len(), articles.len());
        assert_eq!(titles(&articles), vec![" Same ", "Other"]);
    }

    #[tokio::test]
    async fn test_failing_source_is_skipped() {
        let (broken, broken_calls) = FakeSource::failing("broken");
        let (backup, _) = FakeSource::new("backup", numbered("b", 3));
        let aggregator = Aggregator::new(vec![Box::new(broken), Box::new(backup)]);

        let articles = aggregator.collect("ai", 3).await;

        assert_eq!(broken_calls.lock().unwrap().len(), 1);
        assert_eq!(titles(&articles), vec!["b 0", "b 1", "b 2"]);
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty() {
        let (a, _) = FakeSource::failing("a");
        let (b, _) = FakeSource::failing("b");
        let aggregator = Aggregator::new(vec![Box::new(a), Box::new(b)]);

        assert!(aggregator.collect("ai", 3).await.is_empty());
        assert!(
            aggregator
                .collect_for_keywords(&["ai".to_string(), "chips".to_string()], 3)
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_repeated_keyword_keeps_one_copy_per_link() {
        let (a, calls) = FakeSource::new("a", vec![article("AI news", "http://a/1")]);
        let aggregator = Aggregator::new(vec![Box::new(a)]);

        let articles = aggregator
            .collect_for_keywords(&["ai".to_string(), "ai".to_string()], 5)
            .await;

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(articles, vec![article("AI news", "http://a/1")]);
    }

    #[tokio::test]
    async fn test_keyword_merge_uses_link_not_title() {
        // Same title, different links: title dedup only applies within a keyword.
        struct PerKeyword;

        #[async_trait]
        impl Source for PerKeyword {
            fn name(&self) -> &str {
                "per-keyword"
            }

            async fn search(&self, query: &str, _limit: usize) -> Result<Vec<Article>> {
                Ok(vec![
                    article("Shared headline", &format!("http://{query}/1")),
                    article(&format!("{query} only"), "http://shared/1"),
                ])
            }
        }

        let aggregator = Aggregator::new(vec![Box::new(PerKeyword)]);
        let articles = aggregator
            .collect_for_keywords(&["x".to_string(), "y".to_string()], 5)
            .await;

        let links: Vec<&str> = articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links, vec!["http://x/1", "http://shared/1", "http://y/1"]);
        let unique: HashSet<&str> = links.iter().copied().collect();
        assert_eq!(unique.len(), links.len());
    }

    #[tokio::test]
    async fn test_keyword_order_is_preserved() {
        struct Echo;

        #[async_trait]
        impl Source for Echo {
            fn name(&self) -> &str {
                "echo"
            }

            async fn search(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
                Ok((0..limit)
                    .map(|i| article(&format!("{query} {i}"), &format!("http://{query}/{i}")))
                    .collect())
            }
        }

        let aggregator = Aggregator::new(vec![Box::new(Echo)]);
        let articles = aggregator
            .collect_for_keywords(&["first".to_string(), "second".to_string()], 2)
            .await;

        assert_eq!(titles(&articles), vec!["first 0", "first 1", "second 0", "second 1"]);
        assert_eq!(aggregator.source_names(), vec!["echo"]);
    }
}
