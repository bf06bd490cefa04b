//! Digest delivery over SMTP.
//!
//! [`SmtpMailer`] sends the rendered HTML over a STARTTLS relay with
//! username/password credentials. Delivery reports a plain `bool`: failures
//! are logged and never retried. In dry-run mode nothing is sent; the
//! recipients and the start of the document are logged instead.

use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, instrument};

use crate::error::{DigestError, Result};
use crate::models::DATE_FORMAT;
use crate::settings::Settings;
use crate::utils::truncate_chars;

/// Keywords shown in the subject line.
pub const SUBJECT_KEYWORDS: usize = 3;

/// Characters of the document logged by a dry run.
pub const PREVIEW_LENGTH: usize = 1000;

/// `[News Digest] YYYY-MM-DD - kw1, kw2, kw3`
pub fn digest_subject(keywords: &[String], date: NaiveDate) -> String {
    let shown = keywords
        .iter()
        .take(SUBJECT_KEYWORDS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[News Digest] {} - {shown}", date.format(DATE_FORMAT))
}

/// Something that can hand a rendered digest to its readers.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Returns `true` when the digest was sent (or previewed).
    async fn deliver(&self, subject: &str, html: &str, article_count: usize) -> bool;
}

/// SMTP delivery configured from [`Settings`].
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    server: String,
    port: u16,
    sender: String,
    password: String,
    recipients: Vec<String>,
    dry_run: bool,
}

impl SmtpMailer {
    pub fn from_settings(settings: &Settings, dry_run: bool) -> Self {
        Self {
            server: settings.smtp_server.clone(),
            port: settings.smtp_port,
            sender: settings.sender_email.clone(),
            password: settings.sender_password.clone(),
            recipients: settings.recipients.clone(),
            dry_run,
        }
    }

    fn build_message(&self, subject: &str, html: &str) -> Result<Message> {
        let from: Mailbox = self
            .sender
            .parse()
            .map_err(|e| DigestError::Mail(format!("sender {}: {e}", self.sender)))?;
        let mut builder = Message::builder().from(from).subject(subject);
        for recipient in &self.recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| DigestError::Mail(format!("recipient {recipient}: {e}")))?;
            builder = builder.to(to);
        }
        builder
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| DigestError::Mail(e.to_string()))
    }

    async fn send(&self, message: Message) -> Result<()> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.server)
            .map_err(|e| DigestError::Mail(e.to_string()))?
            .port(self.port)
            .credentials(Credentials::new(self.sender.clone(), self.password.clone()))
            .build();
        transport
            .send(message)
            .await
            .map_err(|e| DigestError::Mail(e.to_string()))?;
        Ok(())
    }

    fn preview(&self, subject: &str, html: &str, article_count: usize) {
        info!(
            recipients = ?self.recipients,
            %subject,
            article_count,
            "Dry run: digest not sent"
        );
        info!(preview = %truncate_chars(html, PREVIEW_LENGTH), "Dry run preview");
    }
}

#[async_trait]
impl Delivery for SmtpMailer {
    #[instrument(level = "info", skip(self, html), fields(server = %self.server, port = self.port))]
    async fn deliver(&self, subject: &str, html: &str, article_count: usize) -> bool {
        if self.dry_run {
            self.preview(subject, html, article_count);
            return true;
        }

        let message = match self.build_message(subject, html) {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "Could not build digest email");
                return false;
            }
        };

        match self.send(message).await {
            Ok(()) => {
                info!(recipients = self.recipients.len(), article_count, "Digest email sent");
                true
            }
            Err(e) => {
                error!(error = %e, "Digest email delivery failed");
                false
            }
        }
    }
}
