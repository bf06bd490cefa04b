//! Data model for collected news articles.
//!
//! [`Article`] is the only record that flows through the pipeline. Adapters
//! create it, the enricher fills in `summary`, and the presenter reads it.
//! Nothing is persisted between runs.

use chrono::Local;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DigestError, Result};

/// Prefix carried by `summary` when body extraction failed.
///
/// Downstream code tests for this prefix instead of handling an error.
pub const SUMMARY_FAILURE_PREFIX: &str = "(summary unavailable: ";

/// Display format for feed timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Display format used when only the collection date is known.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single news article collected from one source.
///
/// # Fields
///
/// * `title` - Headline as published by the source
/// * `link` - Absolute URL of the article, the primary dedup key
/// * `published` - Display-formatted timestamp (best effort)
/// * `source` - Human-readable publisher name
/// * `summary` - Body excerpt; empty until enrichment runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub published: String,
    pub source: String,
    #[serde(default)]
    pub summary: String,
}

impl Article {
    /// Create an article with an empty summary.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published: published.into(),
            source: source.into(),
            summary: String::new(),
        }
    }

    /// Lower-cased, trimmed title used as the cross-source dedup key.
    pub fn normalized_title(&self) -> String {
        self.title.trim().to_lowercase()
    }

    /// Whether enrichment ran and left a failure marker.
    pub fn summary_failed(&self) -> bool {
        self.summary.starts_with(SUMMARY_FAILURE_PREFIX)
    }

    /// Whether the summary carries a usable excerpt.
    pub fn has_summary(&self) -> bool {
        !self.summary.is_empty() && !self.summary_failed()
    }
}

/// Build a failure marker for the `summary` field.
pub fn failure_summary(reason: &str) -> String {
    format!("{SUMMARY_FAILURE_PREFIX}{reason})")
}

/// Today's date in the display format, used when a source has no timestamp.
pub fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Check that `link` is an absolute http(s) URL.
///
/// Adapters call this before emitting an [`Article`] so malformed entries are
/// rejected at the boundary.
pub fn validate_link(link: &str) -> Result<Url> {
    let parsed = Url::parse(link.trim())
        .map_err(|e| DigestError::InvalidUrl(format!("{link}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(DigestError::InvalidUrl(format!(
            "{link}: unsupported scheme {other}"
        ))),
    }
}
