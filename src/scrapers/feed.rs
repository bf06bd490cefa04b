//! RSS/Atom feed adapters.
//!
//! [`FeedReader`] reads one publisher feed and keeps entries that mention the
//! keyword. [`FeedDirectory`] walks a list of readers in order, which is how
//! the aggregator covers the whole [`catalog`](super::catalog) behind a single
//! source slot.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;
use feed_rs::model::Entry;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{Source, get_bytes};
use crate::error::{DigestError, Result};
use crate::models::{Article, TIMESTAMP_FORMAT, today, validate_link};
use crate::utils::strip_tags;

const FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Entries requested from each feed when walking a [`FeedDirectory`].
pub const PER_FEED_LIMIT: usize = 10;

/// One publisher's RSS or Atom feed.
#[derive(Debug, Clone)]
pub struct FeedReader {
    name: String,
    url: String,
    client: Client,
    timeout: Duration,
}

impl FeedReader {
    pub fn new(name: impl Into<String>, url: impl Into<String>, client: Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
            timeout: FEED_TIMEOUT,
        }
    }
}

#[async_trait]
impl Source for FeedReader {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "debug", skip(self), fields(source = %self.name))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        let bytes = get_bytes(&self.client, &self.url, self.timeout).await?;
        let articles = parse_entries(&bytes, &self.name, query, limit)?;
        debug!(count = articles.len(), "Parsed feed entries");
        Ok(articles)
    }
}

/// Turn a feed document into articles.
///
/// Entries are kept in document order. When `query` is non-empty, an entry is
/// kept only if its title or description contains it, ignoring case. Entries
/// without a title or with a non-http(s) link are dropped. At most `limit`
/// articles are returned.
pub fn parse_entries(bytes: &[u8], source: &str, query: &str, limit: usize) -> Result<Vec<Article>> {
    let feed = feed_rs::parser::parse(bytes).map_err(DigestError::feed)?;
    let needle = query.trim().to_lowercase();

    Ok(feed
        .entries
        .into_iter()
        .filter(|entry| needle.is_empty() || entry_mentions(entry, &needle))
        .filter_map(|entry| entry_to_article(entry, source))
        .take(limit)
        .collect())
}

fn entry_mentions(entry: &Entry, needle: &str) -> bool {
    let title_hit = entry
        .title
        .as_ref()
        .is_some_and(|t| t.content.to_lowercase().contains(needle));
    if title_hit {
        return true;
    }
    entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .is_some_and(|d| strip_tags(&d).to_lowercase().contains(needle))
}

fn entry_to_article(entry: Entry, source: &str) -> Option<Article> {
    let title = entry.title.map(|t| t.content.trim().to_string())?;
    if title.is_empty() {
        return None;
    }
    let link = entry.links.into_iter().map(|l| l.href).find(|href| validate_link(href).is_ok())?;
    let published = entry.published.or(entry.updated);
    Some(Article::new(title, link, display_time(published), source))
}

/// Render a feed timestamp in local time, or today's date when absent.
pub fn display_time(timestamp: Option<DateTime<Utc>>) -> String {
    display_time_in(timestamp, &Local)
}

/// Render a feed timestamp in `tz`, or today's date when absent.
pub fn display_time_in<Tz>(timestamp: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match timestamp {
        Some(ts) => ts.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
        None => today(),
    }
}

/// Every feed in a list, queried in order behind one source slot.
///
/// Each feed contributes at most [`PER_FEED_LIMIT`] entries; results are
/// de-duplicated by normalized title and the walk stops at `limit`.
pub struct FeedDirectory {
    name: String,
    readers: Vec<FeedReader>,
    per_feed_limit: usize,
}

impl FeedDirectory {
    pub fn new(name: impl Into<String>, readers: Vec<FeedReader>) -> Self {
        Self {
            name: name.into(),
            readers,
            per_feed_limit: PER_FEED_LIMIT,
        }
    }
}

#[async_trait]
impl Source for FeedDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "info", skip(self), fields(feeds = self.readers.len()))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        let mut articles = Vec::new();
        let mut seen_titles = HashSet::new();

        for reader in &self.readers {
            if articles.len() >= limit {
                break;
            }
            for article in reader.fetch(query, self.per_feed_limit).await {
                if articles.len() >= limit {
                    break;
                }
                if seen_titles.insert(article.normalized_title()) {
                    articles.push(article);
                }
            }
        }

        info!(count = articles.len(), "Collected feed articles");
        Ok(articles)
    }
}
