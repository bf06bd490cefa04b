//! JSON archive of a digest run.
//!
//! Each run can be archived as one JSON document holding the keywords and
//! the articles that went into the digest.
//!
//! # Output Structure
//!
//! Files are organized by date, one file per run named after its start time:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 080000.json
//!     └── 193012.json
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::{Article, DATE_FORMAT};

/// One archived digest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunArchive {
    pub local_date: String,
    pub local_time: String,
    pub keywords: Vec<String>,
    pub articles: Vec<Article>,
}

impl RunArchive {
    /// Archive stamped with the given local time.
    pub fn new(at: DateTime<Local>, keywords: &[String], articles: &[Article]) -> Self {
        Self {
            local_date: at.format(DATE_FORMAT).to_string(),
            local_time: at.format("%H:%M:%S").to_string(),
            keywords: keywords.to_vec(),
            articles: articles.to_vec(),
        }
    }

    /// `{json_output_dir}/{date}/{HHMMSS}.json`
    pub fn path_in(&self, json_output_dir: &Path) -> PathBuf {
        json_output_dir
            .join(&self.local_date)
            .join(format!("{}.json", self.local_time.replace(':', "")))
    }
}

/// Write a [`RunArchive`] under `json_output_dir`.
///
/// # Arguments
///
/// * `archive` - The run to serialize
/// * `json_output_dir` - Base directory for JSON output
///
/// # Returns
///
/// The path of the written file, or an error if directory creation or file
/// writing fails.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_archive(archive: &RunArchive, json_output_dir: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(archive)?;
    let path = archive.path_in(json_output_dir);

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = archive.articles.len(), "Wrote JSON archive");
    Ok(path)
}
