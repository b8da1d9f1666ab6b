//! Tag sources: command line, a tags file, or an environment variable.
//!
//! Loading never fails the run. A missing file or variable is logged and
//! yields no tags, and `main` stops when nothing was resolved.

use crate::cli::Cli;
use itertools::Itertools;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Read tags from a file, one per line.
///
/// Lines are trimmed. Blank lines and `#` comments are skipped.
pub fn load_tags_from_file(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let tags: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect();
            info!(count = tags.len(), path = %path.display(), "Loaded tags from file");
            tags
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error loading tags file");
            Vec::new()
        }
    }
}

/// Split a comma-separated tag list, dropping empty entries.
pub fn parse_tag_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a comma-separated tag list from the environment variable `var`.
pub fn load_tags_from_env(var: &str) -> Vec<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            let tags = parse_tag_list(&value);
            info!(count = tags.len(), %var, "Loaded tags from environment");
            tags
        }
        _ => {
            warn!(%var, "Environment variable not found or empty");
            Vec::new()
        }
    }
}

/// Whether `tag` can be used as a URL segment and a file name.
fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag != "."
        && tag != ".."
        && !tag.contains(['/', '\\'])
        && !tag.chars().any(char::is_whitespace)
}

/// Resolve the tags for this run from whichever source the CLI selected.
///
/// Repeated tags are collapsed, keeping the first occurrence. Tags with path
/// separators or whitespace are dropped with a warning.
pub fn resolve_tags(cli: &Cli) -> Vec<String> {
    let tags = if !cli.tags.is_empty() {
        info!(count = cli.tags.len(), "Using tags from command line");
        cli.tags.clone()
    } else if let Some(path) = &cli.tags_file {
        load_tags_from_file(path)
    } else if let Some(var) = &cli.tags_env {
        load_tags_from_env(var)
    } else {
        Vec::new()
    };
    tags.into_iter()
        .filter(|tag| {
            let valid = is_valid_tag(tag);
            if !valid {
                warn!(%tag, "Ignoring tag that is not a single path segment");
            }
            valid
        })
        .unique()
        .collect()
}
