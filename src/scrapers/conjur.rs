//! Consultor Jurídico tag scraper.
//!
//! This module scrapes the tag listing pages of [ConJur](https://www.conjur.com.br).
//! Each tag has a paginated listing at `/tag/<tag>/`, `/tag/<tag>/page/2/`, ...
//! where every article is an `article.lines` block carrying the headline,
//! category label, authors, date and thumbnail.
//!
//! # Crawl
//!
//! Page 1 is fetched first and also tells us how many pages exist. The
//! remaining pages (up to the caller's ceiling) are fetched concurrently, put
//! back in page order, and the articles are deduplicated by URL.

use crate::models::{Article, TagArticles};
use crate::scrapers::fetch_page;
use crate::utils::parse_pt_date;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Public origin of the site.
pub const BASE_URL: &str = "https://www.conjur.com.br";

/// Pages fetched per tag when the caller doesn't say otherwise.
pub const DEFAULT_MAX_PAGES: u32 = 3;

static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article.lines").unwrap());
static HEADLINE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static CATEGORY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("span.chapeu").unwrap());
static AUTHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("author").unwrap());
static TIME_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static THUMB_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("figure.thumb img").unwrap());
static PAGINATION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("nav.pagination").unwrap());
static PAGE_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.page-numbers:not(.next)").unwrap());

/// Visible text of an element with runs of whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).join(" ")
}

/// Prefix a site-relative link with the site origin; absolute links are kept.
///
/// The path is copied as written so the same article reached through an
/// absolute and a relative link ends up with one URL.
fn canonicalize_url(href: &str, base_url: &Url) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    let origin = base_url.as_str().trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    }
}

/// Split the author line (`"Ana Lima, Victor Nunes - "`) into names.
fn parse_authors(raw: &str) -> Vec<String> {
    raw.trim_end_matches([' ', '-'])
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_article(element: ElementRef<'_>, base_url: &Url) -> Option<Article> {
    let headline = element.select(&HEADLINE_SELECTOR).next()?;
    let link = headline.select(&LINK_SELECTOR).next()?;

    let title = element_text(link);
    let href = link.value().attr("href").unwrap_or_default().trim();
    if title.is_empty() || href.is_empty() {
        return None;
    }

    let category = element
        .select(&CATEGORY_SELECTOR)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let authors = element
        .select(&AUTHOR_SELECTOR)
        .next()
        .map(|el| parse_authors(&element_text(el)))
        .unwrap_or_default();
    let published = element
        .select(&TIME_SELECTOR)
        .next()
        .and_then(|el| parse_pt_date(&element_text(el)));
    let image_url = element
        .select(&THUMB_SELECTOR)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);

    Some(Article {
        title,
        url: canonicalize_url(href, base_url),
        authors,
        category,
        published,
        image_url,
    })
}

/// Extract every article block from a listing page, in document order.
///
/// Blocks without a headline link, a title or an `href` are skipped.
/// Missing optional fields fall back to empty values. No deduplication is
/// done here.
pub fn parse_articles_from_html(html: &str, base_url: &Url) -> Vec<Article> {
    let document = Html::parse_document(html);
    let mut articles = Vec::new();
    for element in document.select(&ARTICLE_SELECTOR) {
        match parse_article(element, base_url) {
            Some(article) => {
                debug!(title = %article.title, "Parsed article");
                articles.push(article);
            }
            None => debug!("Skipping article block without headline link"),
        }
    }
    articles
}

/// Number of listing pages advertised by the pagination block, at least 1.
///
/// Labels that aren't numbers (the `…` marker) are ignored, and so is the
/// "next" arrow.
pub fn get_total_pages_from_html(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let Some(pagination) = document.select(&PAGINATION_SELECTOR).next() else {
        return 1;
    };
    pagination
        .select(&PAGE_LINK_SELECTOR)
        .filter_map(|link| element_text(link).parse::<u32>().ok())
        .fold(1, u32::max)
}

/// Crawls ConJur tag listings over one shared HTTP client.
#[derive(Debug, Clone)]
pub struct ConjurScraper {
    client: Client,
    base_url: Url,
}

impl ConjurScraper {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Listing URL for `tag`, page 1.
    pub fn tag_url(&self, tag: &str) -> String {
        format!("{}/tag/{}/", self.base_url.as_str().trim_end_matches('/'), tag)
    }

    /// Listing URL for `tag`, page `page`.
    pub fn tag_page_url(&self, tag: &str, page: u32) -> String {
        if page <= 1 {
            self.tag_url(tag)
        } else {
            format!("{}page/{}/", self.tag_url(tag), page)
        }
    }

    /// Scrape up to `max_pages` listing pages for one tag.
    ///
    /// Returns the unique articles in discovery order: page 1 first, then
    /// page 2 and so on, document order within a page. When page 1 can't be
    /// fetched the tag yields nothing and no other page is requested. A
    /// failed later page only loses its own articles.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape_tag(&self, tag: &str, max_pages: u32) -> Vec<Article> {
        info!("Scraping tag");

        let Some(first_page) = fetch_page(&self.client, &self.tag_url(tag)).await else {
            warn!(%tag, "Failed to fetch first page for tag");
            return Vec::new();
        };

        let mut all_articles = parse_articles_from_html(&first_page, &self.base_url);
        let total_pages = get_total_pages_from_html(&first_page);
        let pages_to_fetch = total_pages.min(max_pages.max(1));
        info!(%tag, total_pages, pages_to_fetch, "Discovered listing pages");

        if pages_to_fetch > 1 {
            let client = &self.client;
            let mut pages: Vec<(u32, Option<String>)> = stream::iter(2..=pages_to_fetch)
                .map(|page| {
                    let url = self.tag_page_url(tag, page);
                    async move { (page, fetch_page(client, &url).await) }
                })
                .buffer_unordered(pages_to_fetch as usize - 1)
                .collect()
                .await;

            // Completion order is arbitrary.
            pages.sort_by_key(|(page, _)| *page);

            for (page, html) in pages {
                match html {
                    Some(html) => {
                        all_articles.extend(parse_articles_from_html(&html, &self.base_url))
                    }
                    None => warn!(%tag, page, "Skipping listing page that failed to fetch"),
                }
            }
        }

        let unique_articles: Vec<Article> = all_articles
            .into_iter()
            .unique_by(|article| article.url.clone())
            .collect();

        info!(%tag, count = unique_articles.len(), "Scraped unique articles");
        unique_articles
    }

    /// Scrape every tag concurrently.
    ///
    /// The result has one entry per tag, in the order given, including tags
    /// that produced no articles.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape_all_tags(&self, tags: &[String], max_pages: u32) -> TagArticles {
        let results = join_all(tags.iter().map(|tag| self.scrape_tag(tag, max_pages))).await;
        tags.iter().cloned().zip(results).collect()
    }
}
