//! # ConJur RSS Feed
//!
//! Crawls the tag listing pages of Consultor Jurídico (ConJur) and publishes
//! the articles as RSS 2.0 feeds: one per tag plus a combined feed.
//!
//! ## Usage
//!
//! ```sh
//! conjur_rss_feed --tags itcmd reforma-tributaria --output-dir ./public
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Tags**: Resolve tags from the command line, a file or an env variable
//! 2. **Scraping**: Fetch each tag's listing pages concurrently over one client
//! 3. **Deduplication**: Keep the first article per URL within each tag
//! 4. **Output**: Write `<tag>.xml` per tag and a combined `feed.xml`
//!
//! Network failures only shrink a tag's results. The run aborts only when the
//! output directory can't be prepared or a feed can't be written.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod models;
mod outputs;
mod scrapers;
mod tags;
mod utils;

use cli::Cli;
use models::TagArticles;
use outputs::rss;
use scrapers::build_client;
use scrapers::conjur::ConjurScraper;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    debug!(?args, "Parsed CLI arguments");

    let tags = tags::resolve_tags(&args);
    if tags.is_empty() {
        error!("No tags provided. Use --tags, --tags-file, or --tags-env");
        return Ok(());
    }

    run(&args, &tags).await?;
    Ok(())
}

/// Scrape every tag and write the feeds. Returns the per-tag articles.
#[instrument(level = "info", skip(args))]
async fn run(args: &Cli, tags: &[String]) -> Result<TagArticles, Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!(?tags, "Starting ConJur RSS feed generator");

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let scraper = ConjurScraper::new(build_client()?, args.base_url.clone());
    let tag_articles = scraper.scrape_all_tags(tags, args.max_pages).await;

    for (tag, articles) in &tag_articles {
        if articles.is_empty() {
            warn!(%tag, "No articles found for tag");
        }
        rss::write_tag_feed(tag, articles, &args.output_dir, scraper.base_url()).await?;
    }

    if tag_articles.iter().any(|(_, articles)| !articles.is_empty()) {
        rss::write_combined_feed(&tag_articles, &args.output_dir, scraper.base_url()).await?;
    } else {
        warn!("Every tag came back empty; skipping combined feed");
    }

    let total_articles: usize = tag_articles.iter().map(|(_, articles)| articles.len()).sum();
    let elapsed = start_time.elapsed();
    info!(
        tags = tag_articles.len(),
        total_articles,
        ?elapsed,
        "Done generating feeds"
    );

    Ok(tag_articles)
}
