//! RSS 2.0 output.
//!
//! One document is written per tag (`<tag>.xml`) and one combined document
//! (`feed.xml`) merges every tag's unique articles.
//!
//! # Item Order
//!
//! Items are written in the reverse of the article order they are given.
//! For the combined feed the articles are first flattened in tag order and
//! deduplicated by URL, then reversed.

use crate::models::{Article, TagArticles};
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::HashSet;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// File name of the combined feed.
pub const COMBINED_FEED_FILENAME: &str = "feed.xml";

const FEED_AUTHOR: &str = "Consultor Jurídico";
const FEED_LANGUAGE: &str = "pt-BR";
const GENERATOR: &str = concat!("conjur_rss_feed ", env!("CARGO_PKG_VERSION"));
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Channel-level metadata for one document.
struct Channel {
    title: String,
    link: String,
    self_href: String,
    subtitle: String,
}

/// One `<item>`: the article plus the title to show for it.
struct Item<'a> {
    title: String,
    article: &'a Article,
}

fn write_text_element<W: Write>(
    w: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Best guess at an image MIME type from the URL's extension.
fn image_mime_type(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        _ => "image/jpeg",
    }
}

fn write_item<W: Write>(w: &mut Writer<W>, item: &Item<'_>) -> Result<(), Box<dyn Error>> {
    let article = item.article;
    w.write_event(Event::Start(BytesStart::new("item")))?;
    write_text_element(w, "title", &item.title)?;
    write_text_element(w, "link", &article.url)?;
    write_text_element(w, "description", &article.summary_line())?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "true"));
    w.write_event(Event::Start(guid))?;
    w.write_event(Event::Text(BytesText::new(&article.url)))?;
    w.write_event(Event::End(BytesEnd::new("guid")))?;

    if let Some(published) = article.published {
        write_text_element(w, "pubDate", &published.to_rfc2822())?;
        write_text_element(w, "atom:updated", &published.to_rfc3339())?;
    }

    if let Some(image_url) = &article.image_url {
        let mut enclosure = BytesStart::new("enclosure");
        enclosure.push_attribute(("url", image_url.as_str()));
        enclosure.push_attribute(("length", "0"));
        enclosure.push_attribute(("type", image_mime_type(image_url)));
        w.write_event(Event::Empty(enclosure))?;
    }

    w.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

/// Render a complete RSS document. `items` are written in the order given.
fn render_rss(
    channel: &Channel,
    items: &[Item<'_>],
    built_at: DateTime<Utc>,
) -> Result<String, Box<dyn Error>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", ATOM_NS));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", &channel.title)?;
    write_text_element(&mut writer, "link", &channel.link)?;
    let mut self_link = BytesStart::new("atom:link");
    self_link.push_attribute(("href", channel.self_href.as_str()));
    self_link.push_attribute(("rel", "self"));
    self_link.push_attribute(("type", "application/rss+xml"));
    writer.write_event(Event::Empty(self_link))?;
    write_text_element(&mut writer, "description", &channel.subtitle)?;
    write_text_element(&mut writer, "managingEditor", FEED_AUTHOR)?;
    write_text_element(&mut writer, "language", FEED_LANGUAGE)?;
    write_text_element(&mut writer, "lastBuildDate", &built_at.to_rfc2822())?;
    write_text_element(&mut writer, "generator", GENERATOR)?;

    for item in items {
        write_item(&mut writer, item)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut out = writer.into_inner();
    out.push(b'\n');
    Ok(String::from_utf8(out)?)
}

/// Render the feed for one tag.
///
/// Items appear in the reverse of `articles` order. An empty slice yields a
/// valid document with no items.
pub fn render_tag_feed(
    tag: &str,
    articles: &[Article],
    base_url: &Url,
    built_at: DateTime<Utc>,
) -> Result<String, Box<dyn Error>> {
    let readable_tag = tag.replace('-', " ");
    let channel = Channel {
        title: format!("ConJur - {}", readable_tag.to_uppercase()),
        link: format!("{}/tag/{}/", base_url.as_str().trim_end_matches('/'), tag),
        self_href: format!("{}.xml", tag),
        subtitle: format!("Últimas notícias sobre {} no Consultor Jurídico", readable_tag),
    };
    let items: Vec<Item<'_>> = articles
        .iter()
        .rev()
        .map(|article| Item {
            title: article.title.clone(),
            article,
        })
        .collect();
    render_rss(&channel, &items, built_at)
}

/// Flatten every tag's articles into `(tag, article)` pairs, keeping the
/// first occurrence of each URL across all tags.
pub fn unique_tagged_articles(tag_articles: &TagArticles) -> Vec<(&str, &Article)> {
    let mut seen_urls: HashSet<&str> = HashSet::new();
    tag_articles
        .iter()
        .flat_map(|(tag, articles)| articles.iter().map(move |a| (tag.as_str(), a)))
        .filter(|&(_, article)| seen_urls.insert(article.url.as_str()))
        .collect()
}

/// Render the combined feed across every tag.
///
/// Each item title is prefixed with `[TAG] `, where the tag is the first one
/// (in map order) that listed the article.
pub fn render_combined_feed(
    tag_articles: &TagArticles,
    base_url: &Url,
    built_at: DateTime<Utc>,
) -> Result<String, Box<dyn Error>> {
    let channel = Channel {
        title: "ConJur - Combined Feed".to_string(),
        link: base_url.as_str().trim_end_matches('/').to_string(),
        self_href: COMBINED_FEED_FILENAME.to_string(),
        subtitle: "Últimas notícias de múltiplos temas no Consultor Jurídico".to_string(),
    };
    let items: Vec<Item<'_>> = unique_tagged_articles(tag_articles)
        .into_iter()
        .rev()
        .map(|(tag, article)| Item {
            title: format!("[{}] {}", tag.to_uppercase(), article.title),
            article,
        })
        .collect();
    render_rss(&channel, &items, built_at)
}

/// Write `<output_dir>/<tag>.xml` and return its path.
///
/// The directory must already exist. Write failures are returned to the caller.
#[instrument(level = "info", skip(articles, base_url), fields(count = articles.len()))]
pub async fn write_tag_feed(
    tag: &str,
    articles: &[Article],
    output_dir: &Path,
    base_url: &Url,
) -> Result<PathBuf, Box<dyn Error>> {
    let xml = render_tag_feed(tag, articles, base_url, Utc::now())?;
    let output_path = output_dir.join(format!("{}.xml", tag));
    fs::write(&output_path, xml).await?;
    info!(path = %output_path.display(), articles = articles.len(), "Generated feed");
    Ok(output_path)
}

/// Write `<output_dir>/feed.xml` and return its path.
///
/// Callers decide whether a combined feed is wanted when every tag is empty.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_combined_feed(
    tag_articles: &TagArticles,
    output_dir: &Path,
    base_url: &Url,
) -> Result<PathBuf, Box<dyn Error>> {
    let xml = render_combined_feed(tag_articles, base_url, Utc::now())?;
    let output_path = output_dir.join(COMBINED_FEED_FILENAME);
    fs::write(&output_path, xml).await?;
    info!(
        path = %output_path.display(),
        articles = unique_tagged_articles(tag_articles).len(),
        "Generated combined feed"
    );
    Ok(output_path)
}
