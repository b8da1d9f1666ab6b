//! Data models for scraped articles and per-tag results.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: One article record extracted from a tag listing page
//! - [`TagArticles`]: The ordered result of a run, one entry per requested tag

use chrono::{DateTime, Utc};

/// A single article as listed on a ConJur tag page.
///
/// Articles are built once by the extractor and never mutated afterwards.
/// The canonical `url` is the identity key: two articles with the same URL
/// are duplicates no matter how the other fields differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// The headline text, trimmed. Never empty.
    pub title: String,
    /// Absolute article URL.
    pub url: String,
    /// Author names in listing order.
    pub authors: Vec<String>,
    /// The "chapéu" label shown above the headline, or empty.
    pub category: String,
    /// Publication time, when the listing date could be parsed.
    pub published: Option<DateTime<Utc>>,
    /// Thumbnail image URL.
    pub image_url: Option<String>,
}

impl Article {
    /// Short description used in feed items.
    ///
    /// Renders as `"[category] - Por author1, author2"`, dropping whichever
    /// segment is empty. Falls back to the title when both are empty.
    pub fn summary_line(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if !self.category.is_empty() {
            parts.push(format!("[{}]", self.category));
        }
        if !self.authors.is_empty() {
            parts.push(format!("Por {}", self.authors.join(", ")));
        }
        if parts.is_empty() {
            self.title.clone()
        } else {
            parts.join(" - ")
        }
    }
}

/// Articles grouped by tag, in the order the tags were requested.
///
/// Every requested tag has an entry, including tags that produced nothing.
pub type TagArticles = Vec<(String, Vec<Article>)>;
