//! Utility functions for date parsing and file system checks.
//!
//! - Portuguese long-form date parsing for listing timestamps
//! - Output directory validation before a run starts

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static PT_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})\s+de\s+(\w+)\s+de\s+(\d{4})\s+às\s+(\d{2}):(\d{2})").unwrap()
});

const MONTHS_PT: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Look up a Portuguese month name, ignoring case. Returns 1..=12.
fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS_PT
        .iter()
        .position(|m| *m == name)
        .map(|idx| idx as u32 + 1)
}

/// Parse a listing date such as `"2 de fevereiro de 2026 às 07:33"`.
///
/// The numbers are taken as UTC wall-clock time. Returns `None` when the text
/// doesn't match, the month is unknown, or the fields don't form a real
/// calendar date (e.g. `31 de abril`).
pub fn parse_pt_date(text: &str) -> Option<DateTime<Utc>> {
    let caps = PT_DATE_PATTERN.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;

    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and removes a
/// probe file to confirm writes will succeed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_valid_date() {
        let dt = parse_pt_date("2 de fevereiro de 2026 às 07:33").unwrap();
        assert_eq!(dt.year(), 2026);
        assert_eq!(dt.month(), 2);
        assert_eq!(dt.day(), 2);
        assert_eq!(dt.hour(), 7);
        assert_eq!(dt.minute(), 33);
    }

    #[test]
    fn test_parse_date_different_month() {
        let dt = parse_pt_date("15 de setembro de 2025 às 19:36").unwrap();
        assert_eq!(dt.month(), 9);
        assert_eq!(dt.day(), 15);
    }

    #[test]
    fn test_parse_date_with_cedilla_and_case() {
        let dt = parse_pt_date("10 de Março de 2025 às 08:05").unwrap();
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.minute(), 5);
    }

    #[test]
    fn test_parse_date_embedded_in_text() {
        let dt = parse_pt_date("Publicado em 1 de janeiro de 2026 às 00:00 por Redação");
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single());
    }

    #[test]
    fn test_parse_invalid_date() {
        assert_eq!(parse_pt_date("invalid"), None);
        assert_eq!(parse_pt_date(""), None);
    }

    #[test]
    fn test_parse_unknown_month() {
        assert_eq!(parse_pt_date("1 de invalidmonth de 2025 às 10:00"), None);
    }

    #[test]
    fn test_parse_impossible_calendar_date() {
        assert_eq!(parse_pt_date("31 de abril de 2025 às 10:00"), None);
        assert_eq!(parse_pt_date("29 de fevereiro de 2025 às 10:00"), None);
        assert_eq!(parse_pt_date("1 de maio de 2025 às 25:00"), None);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested").join("public");
        ensure_writable_dir(&target).await.unwrap();
        assert!(target.is_dir());
        assert!(!target.join("..__probe_write__").exists());
    }
}
