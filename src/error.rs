//! Error types shared by the collection, enrichment, and delivery stages.
//!
//! Adapters and the extractor return [`Result`] internally. Their public
//! boundaries ([`crate::scrapers::Source::fetch`] and
//! [`crate::enricher::Enricher::enrich`]) never surface these errors; they log
//! them and degrade to empty or sentinel values instead.

use thiserror::Error;

/// Errors produced while collecting, enriching, or delivering a digest.
#[derive(Debug, Error)]
pub enum DigestError {
    /// Transport-level failure, including request timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// The body could not be parsed as RSS/Atom.
    #[error("failed to parse feed: {0}")]
    Feed(String),

    /// A link was relative, malformed, or not http(s).
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// No usable description or body text was found on the page.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// One or more required settings are missing or malformed.
    #[error("invalid configuration: {}", .0.join("; "))]
    Config(Vec<String>),

    /// SMTP message building or transport failure.
    #[error("mail error: {0}")]
    Mail(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DigestError {
    /// Creates an extraction error with a custom message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        DigestError::Extraction(msg.into())
    }

    /// Creates a feed parse error from any displayable parser error.
    pub fn feed(err: impl std::fmt::Display) -> Self {
        DigestError::Feed(err.to_string())
    }
}

/// Result type alias for digest operations.
pub type Result<T> = std::result::Result<T, DigestError>;
