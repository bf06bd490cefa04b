//! Command-line interface definitions for the news digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Delivery settings can be provided via command-line flags, environment
//! variables, or a YAML file passed with `--config`, in that order of
//! precedence.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the news digest.
///
/// # Examples
///
/// ```sh
/// # Collect, summarize, and mail once right now
/// news_digest --now
///
/// # Preview without sending, skip article pages, keep a copy on disk
/// news_digest --now --dry-run --no-summary --html-output ./digest.html
///
/// # Daily at 07:30 with settings from a file
/// news_digest --config ./digest.yaml --schedule-time 07:30
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Run the job once immediately instead of waiting for the schedule
    #[arg(long)]
    pub now: bool,

    /// Render and preview the digest without sending mail
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum articles collected per keyword
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Skip fetching article pages for summaries
    #[arg(long)]
    pub no_summary: bool,

    /// Print the supported sources grouped by category and exit
    #[arg(long)]
    pub list_sources: bool,

    /// Keep only articles whose title contains this text (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Order the digest by source name
    #[arg(long)]
    pub sort_by_source: bool,

    /// Also write the rendered digest to this file
    #[arg(long)]
    pub html_output: Option<PathBuf>,

    /// Archive each run as JSON under this directory
    #[arg(short, long)]
    pub json_output_dir: Option<PathBuf>,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SMTP relay host
    #[arg(long, env = "SMTP_SERVER")]
    pub smtp_server: Option<String>,

    /// SMTP submission port
    #[arg(long, env = "SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// Sender address, also used as the SMTP username
    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    /// SMTP password or app password
    #[arg(long, env = "SENDER_PASSWORD", hide_env_values = true)]
    pub sender_password: Option<String>,

    /// Comma-separated recipient addresses
    #[arg(long, env = "RECIPIENT_EMAILS")]
    pub recipients: Option<String>,

    /// Comma-separated search keywords
    #[arg(short, long, env = "KEYWORDS")]
    pub keywords: Option<String>,

    /// Daily run time as HH:MM (local time)
    #[arg(long, env = "SCHEDULE_TIME")]
    pub schedule_time: Option<String>,
}
