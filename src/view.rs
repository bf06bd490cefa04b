//! Title filter and source ordering applied before rendering.

use crate::models::Article;

/// How the article list is narrowed and ordered for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Case-insensitive title substring; `None` or blank keeps everything.
    pub filter: Option<String>,
    pub sort_by_source: bool,
}

impl ViewOptions {
    /// Filter, then sort, returning a new list.
    pub fn apply(&self, articles: &[Article]) -> Vec<Article> {
        let filtered = match self.filter.as_deref() {
            Some(text) => filter_by_title(articles, text),
            None => articles.to_vec(),
        };
        if self.sort_by_source {
            sort_by_source(filtered)
        } else {
            filtered
        }
    }
}

/// Articles whose title contains `text`, ignoring case.
pub fn filter_by_title(articles: &[Article], text: &str) -> Vec<Article> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return articles.to_vec();
    }
    articles
        .iter()
        .filter(|a| a.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Stable sort by source name.
pub fn sort_by_source(mut articles: Vec<Article>) -> Vec<Article> {
    articles.sort_by(|a, b| a.source.cmp(&b.source));
    articles
}
