//! # News Digest
//!
//! A keyword news aggregator that collects articles from Korean search
//! portals and publisher RSS feeds, optionally pulls a short excerpt from each
//! article page, and mails the result as an HTML digest.
//!
//! ## Features
//!
//! - Scrapes Naver and Daum news search, then falls back to 36 publisher feeds
//! - De-duplicates by title within a keyword and by link across keywords
//! - Extracts best-effort summaries from article pages
//! - Renders an escaped, self-contained HTML digest
//! - Sends the digest over STARTTLS SMTP, or previews it in dry-run mode
//! - Runs once or every day at a configured time
//!
//! ## Usage
//!
//! ```sh
//! KEYWORDS="인공지능,반도체" news_digest --now --dry-run
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Collection**: Query each source in priority order per keyword
//! 2. **Enrichment**: Fetch article pages and extract excerpts (sequential)
//! 3. **Presentation**: Filter, sort, and render HTML
//! 4. **Delivery**: Mail the digest and optionally archive it on disk

use clap::Parser;
use std::error::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod enricher;
mod error;
mod mailer;
mod models;
mod outputs;
mod pipeline;
mod schedule;
mod scrapers;
mod settings;
mod utils;
mod view;

use cli::Cli;
use pipeline::{Pipeline, RunOptions, RunOutcome};
use schedule::next_run_after;
use settings::Settings;
use utils::ensure_writable_dir;
use view::ViewOptions;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(now = args.now, dry_run = args.dry_run, "Parsed CLI arguments");

    if args.list_sources {
        print_sources();
        return Ok(());
    }

    let settings = Settings::resolve(&args)?;
    if let Err(e) = settings.validate() {
        error!(error = %e, "Refusing to start with invalid settings");
        return Err(e.into());
    }
    settings.log_summary();

    if let Some(dir) = &args.json_output_dir {
        let dir = dir.to_string_lossy();
        if let Err(e) = ensure_writable_dir(&dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e.into());
        }
    }

    let options = RunOptions {
        dry_run: args.dry_run,
        summarize: !args.no_summary,
        view: ViewOptions {
            filter: args.filter.clone(),
            sort_by_source: args.sort_by_source,
        },
        html_output: args.html_output.clone(),
        json_output_dir: args.json_output_dir.clone(),
    };
    let pipeline = Pipeline::from_settings(&settings, &options)?;

    if args.now {
        let outcome = pipeline.run(&settings, &options).await?;
        if outcome == RunOutcome::NoArticles {
            warn!("Nothing to send");
        }
        return Ok(());
    }

    run_daily(&pipeline, &settings, &options).await
}

/// Run the job every day at the configured time until Ctrl-C.
async fn run_daily(
    pipeline: &Pipeline,
    settings: &Settings,
    options: &RunOptions,
) -> Result<(), Box<dyn Error>> {
    let at = settings.schedule_at()?;
    info!(schedule_time = %settings.schedule_time, "Daily schedule started; press Ctrl-C to stop");

    loop {
        let now = chrono::Local::now();
        let next = next_run_after(&now, &at);
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next_run = %next.format("%Y-%m-%d %H:%M"), wait_secs = wait.as_secs(), "Waiting for next run");

        let scheduled = async {
            sleep(wait).await;
            pipeline.run(settings, options).await
        };

        tokio::select! {
            result = scheduled => match result {
                Ok(outcome) => info!(?outcome, "Scheduled run finished"),
                Err(e) => error!(error = %e, "Scheduled run failed"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; stopping scheduler");
                return Ok(());
            }
        }
    }
}

fn print_sources() {
    println!(
        "Supported news sources ({}):",
        scrapers::catalog::source_count()
    );
    for (category, names) in scrapers::catalog::sources_by_category() {
        println!("\n[{category}]");
        for name in names {
            println!("  - {name}");
        }
    }
}
