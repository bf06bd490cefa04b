//! Runtime settings.
//!
//! Values are layered, highest priority first:
//!
//! 1. Command-line flags
//! 2. Environment variables (`SMTP_SERVER`, `SMTP_PORT`, `SENDER_EMAIL`,
//!    `SENDER_PASSWORD`, `RECIPIENT_EMAILS`, `KEYWORDS`, `SCHEDULE_TIME`)
//! 3. The YAML file named by `--config`
//! 4. Built-in defaults
//!
//! Layers 1 and 2 are merged by clap before this module sees them.
//!
//! # YAML Example
//!
//! ```yaml
//! smtp_server: smtp.gmail.com
//! smtp_port: 587
//! sender_email: digest@example.com
//! sender_password: app-password
//! recipients: [alice@example.com, bob@example.com]
//! keywords: "인공지능, 반도체"
//! schedule_time: "08:00"
//! limit_per_keyword: 30
//! ```

use chrono::NaiveTime;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{info, instrument};

use crate::cli::Cli;
use crate::error::{DigestError, Result};
use crate::schedule::parse_schedule_time;
use crate::utils::split_list;

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SCHEDULE_TIME: &str = "08:00";
pub const DEFAULT_LIMIT_PER_KEYWORD: usize = 50;

/// A list setting written either as a YAML sequence or a comma-separated string.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ListSetting {
    Many(Vec<String>),
    Csv(String),
}

impl ListSetting {
    fn into_items(self) -> Vec<String> {
        match self {
            ListSetting::Many(items) => items
                .iter()
                .flat_map(|item| split_list(item))
                .collect(),
            ListSetting::Csv(raw) => split_list(&raw),
        }
    }
}

/// Contents of the optional YAML settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSettings {
    pub smtp_server: Option<String>,
    pub smtp_port: Option<u16>,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    pub recipients: Option<ListSetting>,
    pub keywords: Option<ListSetting>,
    pub schedule_time: Option<String>,
    pub limit_per_keyword: Option<usize>,
}

impl FileSettings {
    /// Read and parse a YAML settings file.
    #[instrument(level = "info", fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings = serde_yaml::from_str(&raw)?;
        info!("Loaded settings file");
        Ok(settings)
    }
}

/// Fully resolved settings for one process.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_password: String,
    pub recipients: Vec<String>,
    pub keywords: Vec<String>,
    pub schedule_time: String,
    pub limit_per_keyword: usize,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.sender_password.is_empty() { "" } else { "********" };
        f.debug_struct("Settings")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("sender_email", &self.sender_email)
            .field("sender_password", &password)
            .field("recipients", &self.recipients)
            .field("keywords", &self.keywords)
            .field("schedule_time", &self.schedule_time)
            .field("limit_per_keyword", &self.limit_per_keyword)
            .finish()
    }
}

impl Settings {
    /// Resolve settings from parsed arguments, loading `--config` if given.
    ///
    /// Only I/O and YAML errors are reported here; call
    /// [`validate`](Self::validate) to check the result.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };
        Ok(Self::merge(cli, file))
    }

    /// Layer arguments over file values over defaults.
    pub fn merge(cli: &Cli, file: FileSettings) -> Self {
        let recipients = cli
            .recipients
            .as_deref()
            .map(split_list)
            .or_else(|| file.recipients.map(ListSetting::into_items))
            .unwrap_or_default();
        let keywords = cli
            .keywords
            .as_deref()
            .map(split_list)
            .or_else(|| file.keywords.map(ListSetting::into_items))
            .unwrap_or_default();

        Self {
            smtp_server: non_blank(cli.smtp_server.clone())
                .or(non_blank(file.smtp_server))
                .unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            smtp_port: cli.smtp_port.or(file.smtp_port).unwrap_or(DEFAULT_SMTP_PORT),
            sender_email: non_blank(cli.sender_email.clone())
                .or(non_blank(file.sender_email))
                .unwrap_or_default(),
            sender_password: non_blank(cli.sender_password.clone())
                .or(non_blank(file.sender_password))
                .unwrap_or_default(),
            recipients,
            keywords,
            schedule_time: non_blank(cli.schedule_time.clone())
                .or(non_blank(file.schedule_time))
                .unwrap_or_else(|| DEFAULT_SCHEDULE_TIME.to_string()),
            limit_per_keyword: cli
                .limit
                .or(file.limit_per_keyword)
                .unwrap_or(DEFAULT_LIMIT_PER_KEYWORD),
        }
    }

    /// Check required values, reporting every problem at once.
    ///
    /// Problems are listed in a fixed order: sender email, sender password,
    /// recipients, keywords, schedule time.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.sender_email.is_empty() {
            problems.push("SENDER_EMAIL is not set".to_string());
        }
        if self.sender_password.is_empty() {
            problems.push("SENDER_PASSWORD is not set".to_string());
        }
        if self.recipients.is_empty() {
            problems.push("RECIPIENT_EMAILS is not set".to_string());
        }
        if self.keywords.is_empty() {
            problems.push("KEYWORDS is not set".to_string());
        }
        if parse_schedule_time(&self.schedule_time).is_err() {
            problems.push(format!(
                "SCHEDULE_TIME must be HH:MM, got {:?}",
                self.schedule_time
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DigestError::Config(problems))
        }
    }

    /// Parsed daily run time.
    pub fn schedule_at(&self) -> Result<NaiveTime> {
        parse_schedule_time(&self.schedule_time)
    }

    /// Log the effective settings without credentials.
    pub fn log_summary(&self) {
        info!(
            smtp_server = %self.smtp_server,
            smtp_port = self.smtp_port,
            sender = %self.sender_email,
            recipients = self.recipients.len(),
            keywords = ?self.keywords,
            schedule_time = %self.schedule_time,
            limit_per_keyword = self.limit_per_keyword,
            "Effective settings"
        );
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
