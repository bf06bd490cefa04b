//! One digest job from settings to delivery.
//!
//! The job runs in a fixed order:
//! 1. **Validate**: settings are checked before any network activity
//! 2. **Collect**: every keyword through the [`Aggregator`]
//! 3. **Enrich**: optional page excerpts via the [`Enricher`]
//! 4. **View**: title filter and source ordering
//! 5. **Output**: optional HTML file and JSON archive
//! 6. **Deliver**: mail the digest, or preview it in dry-run mode
//!
//! An empty collection stops the job before rendering.

use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::aggregator::Aggregator;
use crate::enricher::{Enricher, PageExtractor};
use crate::error::Result;
use crate::mailer::{Delivery, SmtpMailer, digest_subject};
use crate::outputs::{html, json};
use crate::scrapers::catalog::default_sources;
use crate::scrapers::http_client;
use crate::settings::Settings;
use crate::view::ViewOptions;

/// Per-invocation switches from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub summarize: bool,
    pub view: ViewOptions,
    pub html_output: Option<PathBuf>,
    pub json_output_dir: Option<PathBuf>,
}

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NoArticles,
    DryRun { articles: usize },
    Delivered { articles: usize },
    DeliveryFailed { articles: usize },
}

/// The wired stages of a digest job.
pub struct Pipeline {
    aggregator: Aggregator,
    enricher: Option<Enricher>,
    delivery: Box<dyn Delivery>,
}

impl Pipeline {
    pub fn new(aggregator: Aggregator, enricher: Option<Enricher>, delivery: Box<dyn Delivery>) -> Self {
        Self {
            aggregator,
            enricher,
            delivery,
        }
    }

    /// Production wiring: catalog sources, page extractor, SMTP delivery.
    pub fn from_settings(settings: &Settings, options: &RunOptions) -> Result<Self> {
        let client = http_client()?;
        let enricher = options
            .summarize
            .then(|| Enricher::new(Box::new(PageExtractor::new(client.clone()))));
        let aggregator = Aggregator::new(default_sources(&client));
        info!(
            sources = ?aggregator.source_names(),
            summarize = options.summarize,
            "Pipeline ready"
        );
        Ok(Self::new(
            aggregator,
            enricher,
            Box::new(SmtpMailer::from_settings(settings, options.dry_run)),
        ))
    }

    /// Run one job.
    ///
    /// # Returns
    ///
    /// The [`RunOutcome`], or a configuration error when `settings` do not
    /// validate. Output-file failures are logged and do not stop delivery.
    #[instrument(level = "info", skip_all, fields(keywords = ?settings.keywords, dry_run = options.dry_run))]
    pub async fn run(&self, settings: &Settings, options: &RunOptions) -> Result<RunOutcome> {
        settings.validate()?;
        let started = Instant::now();
        let run_at = Local::now();

        let mut articles = self
            .aggregator
            .collect_for_keywords(&settings.keywords, settings.limit_per_keyword)
            .await;
        if articles.is_empty() {
            warn!("No articles collected; skipping delivery");
            return Ok(RunOutcome::NoArticles);
        }
        info!(count = articles.len(), "Collected articles");

        if let Some(enricher) = &self.enricher {
            articles = enricher.enrich(articles).await;
        }

        let articles = options.view.apply(&articles);
        let count = articles.len();
        let document = html::render(&articles, &settings.keywords);

        if let Some(path) = &options.html_output {
            if let Err(e) = html::write_digest(&document, path).await {
                error!(path = %path.display(), error = %e, "Failed to write HTML digest");
            }
        }
        if let Some(dir) = &options.json_output_dir {
            let archive = json::RunArchive::new(run_at, &settings.keywords, &articles);
            if let Err(e) = json::write_archive(&archive, dir).await {
                error!(dir = %dir.display(), error = %e, "Failed to write JSON archive");
            }
        }

        let subject = digest_subject(&settings.keywords, run_at.date_naive());
        let delivered = self.delivery.deliver(&subject, &document, count).await;

        let elapsed = started.elapsed();
        let outcome = match (delivered, options.dry_run) {
            (true, true) => RunOutcome::DryRun { articles: count },
            (true, false) => RunOutcome::Delivered { articles: count },
            (false, _) => RunOutcome::DeliveryFailed { articles: count },
        };
        info!(?outcome, secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "Job complete");
        Ok(outcome)
    }
}
