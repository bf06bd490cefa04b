//! HTML digest rendering.
//!
//! Produces a self-contained document: a header with the date and keywords,
//! summary statistics, and one table row per article. Every piece of scraped
//! text goes through [`html_escape`] before it is interpolated, and links that
//! are not absolute http(s) URLs are replaced with `#`.
//!
//! # Truncation
//!
//! | Field | Limit |
//! |-------|-------|
//! | Title | [`TITLE_LENGTH`] characters |
//! | Summary | [`SUMMARY_LENGTH`] characters |

use chrono::{Local, NaiveDate};
use html_escape::{encode_double_quoted_attribute, encode_quoted_attribute};
use itertools::Itertools;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::Result;
use crate::models::{Article, DATE_FORMAT, validate_link};
use crate::utils::truncate_chars;

/// Title length shown in a row.
pub const TITLE_LENGTH: usize = 60;

/// Summary length shown in a row.
pub const SUMMARY_LENGTH: usize = 150;

/// Number of sources listed in the breakdown.
pub const TOP_SOURCES: usize = 5;

/// Marker carried by every article row.
pub const ROW_MARKER: &str = r#"class="article-row""#;

const STYLE: &str = r#"
    body { font-family: -apple-system, "Apple SD Gothic Neo", "Malgun Gothic", sans-serif; margin: 0; padding: 24px; background: #f5f6f8; color: #222; }
    .container { max-width: 960px; margin: 0 auto; background: #fff; border-radius: 8px; padding: 24px; }
    h1 { margin: 0 0 4px 0; font-size: 22px; }
    .meta { color: #666; font-size: 13px; margin-bottom: 16px; }
    .stats { background: #eef3fb; border-radius: 6px; padding: 12px 16px; margin-bottom: 20px; font-size: 14px; }
    .stats ul { margin: 6px 0 0 0; padding-left: 20px; }
    table { width: 100%; border-collapse: collapse; }
    th, td { text-align: left; padding: 8px; border-bottom: 1px solid #eee; vertical-align: top; font-size: 14px; }
    th { background: #fafafa; }
    a { color: #1a4fa0; text-decoration: none; }
    .summary { color: #555; font-size: 13px; margin-top: 4px; }
    .source, .published { white-space: nowrap; color: #444; }
    .footer { color: #999; font-size: 12px; margin-top: 20px; text-align: center; }
"#;

/// Escape scraped text, quotes included, so it cannot reproduce markup such
/// as [`ROW_MARKER`].
fn escape(text: &str) -> Cow<'_, str> {
    encode_quoted_attribute(text)
}

/// Per-source article counts, largest first, ties broken by name.
pub fn top_sources(articles: &[Article], n: usize) -> Vec<(&str, usize)> {
    articles
        .iter()
        .map(|a| a.source.as_str())
        .counts()
        .into_iter()
        .sorted_by(|(a_name, a_count), (b_name, b_count)| {
            b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
        })
        .take(n)
        .collect()
}

/// Render a digest dated today.
pub fn render(articles: &[Article], keywords: &[String]) -> String {
    render_with_date(articles, keywords, Local::now().date_naive())
}

/// Render a digest for `date`.
///
/// # Arguments
///
/// * `articles` - Articles in display order
/// * `keywords` - Keywords shown in the header
/// * `date` - Date shown in the header
///
/// # Returns
///
/// A complete HTML document with exactly one `article-row` per article.
pub fn render_with_date(articles: &[Article], keywords: &[String], date: NaiveDate) -> String {
    let date = date.format(DATE_FORMAT).to_string();
    let keyword_list = escape(&keywords.join(", ")).into_owned();
    let source_count = articles.iter().map(|a| a.source.as_str()).unique().count();

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"ko\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>News Digest {date}</title>");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n<div class=\"container\">\n");

    let _ = writeln!(html, "<h1>News Digest</h1>");
    let _ = writeln!(
        html,
        "<div class=\"meta\">{date} &middot; Keywords: {keyword_list}</div>"
    );

    html.push_str("<div class=\"stats\">\n");
    let _ = writeln!(
        html,
        "<strong>{}</strong> articles from <strong>{source_count}</strong> sources",
        articles.len()
    );
    if !articles.is_empty() {
        html.push_str("<ul>\n");
        for (source, count) in top_sources(articles, TOP_SOURCES) {
            let _ = writeln!(html, "<li>{}: {count}</li>", escape(source));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</div>\n");

    if articles.is_empty() {
        html.push_str("<p>No articles were collected.</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr><th>#</th><th>Title</th><th>Source</th><th>Published</th></tr></thead>\n<tbody>\n");
        for (i, article) in articles.iter().enumerate() {
            render_row(&mut html, i + 1, article);
        }
        html.push_str("</tbody>\n</table>\n");
    }

    let _ = writeln!(
        html,
        "<div class=\"footer\">Generated {}</div>",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_row(html: &mut String, index: usize, article: &Article) {
    let href = match validate_link(&article.link) {
        Ok(url) => encode_double_quoted_attribute(url.as_str()).into_owned(),
        Err(_) => "#".to_string(),
    };
    let title = truncate_chars(&article.title, TITLE_LENGTH);

    let _ = writeln!(html, "<tr {ROW_MARKER}>");
    let _ = writeln!(html, "<td>{index}</td>");
    let _ = write!(
        html,
        "<td><a href=\"{href}\" target=\"_blank\">{}</a>",
        escape(&title)
    );
    if !article.summary.is_empty() {
        let summary = truncate_chars(&article.summary, SUMMARY_LENGTH);
        let _ = write!(html, "<div class=\"summary\">{}</div>", escape(&summary));
    }
    html.push_str("</td>\n");
    let _ = writeln!(html, "<td class=\"source\">{}</td>", escape(&article.source));
    let _ = writeln!(
        html,
        "<td class=\"published\">{}</td>",
        escape(&article.published)
    );
    html.push_str("</tr>\n");
}

/// Write a rendered digest to `path`, creating parent directories.
#[instrument(level = "info", skip(html), fields(bytes = html.len()))]
pub async fn write_digest(html: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, html).await?;
    info!(path = %path.display(), "Wrote HTML digest");
    Ok(())
}
