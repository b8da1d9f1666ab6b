//! Command-line interface definitions for the ConJur feed generator.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Everything except the tag sources can also be set through environment
//! variables.

use crate::scrapers::conjur::{BASE_URL, DEFAULT_MAX_PAGES};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Command-line arguments for the ConJur RSS feed generator.
///
/// Tags come from exactly one source: `--tags`, `--tags-file` or `--tags-env`.
///
/// # Examples
///
/// ```sh
/// # Tags on the command line
/// conjur_rss_feed --tags itcmd reforma-tributaria
///
/// # Tags from a file, three pages each, into ./site
/// conjur_rss_feed --tags-file tags.txt --max-pages 3 --output-dir ./site
///
/// # Tags from CONJUR_TAGS="itcmd,stf"
/// conjur_rss_feed --tags-env CONJUR_TAGS
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about = "ConJur RSS Feed Generator")]
#[command(group(ArgGroup::new("tag_source").args(["tags", "tags_file", "tags_env"])))]
pub struct Cli {
    /// List of tags to scrape
    #[arg(long, num_args = 1..)]
    pub tags: Vec<String>,

    /// Path to a file with tags, one per line
    #[arg(long)]
    pub tags_file: Option<PathBuf>,

    /// Environment variable holding comma-separated tags
    #[arg(long)]
    pub tags_env: Option<String>,

    /// Output directory for feeds
    #[arg(long, env = "CONJUR_OUTPUT_DIR", default_value = "public")]
    pub output_dir: PathBuf,

    /// Max pages to scrape per tag
    #[arg(
        long,
        env = "CONJUR_MAX_PAGES",
        default_value_t = DEFAULT_MAX_PAGES,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_pages: u32,

    /// Site origin to scrape
    #[arg(long, env = "CONJUR_BASE_URL", default_value = BASE_URL)]
    pub base_url: url::Url,

    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(long)]
    pub debug: bool,
}
