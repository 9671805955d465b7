//! Utility functions for dates, string handling, and file system checks.
//!
//! - Display formatting for the card date badge
//! - String truncation for logging
//! - Output directory validation

use chrono::NaiveDate;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Format a date the way the feed shows it on cards: `M/D/YYYY`.
///
/// # Examples
///
/// ```ignore
/// let d = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
/// assert_eq!(display_date(d), "1/5/2026");
/// ```
pub fn display_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (backing off to a character
/// boundary) with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure the directory that will hold `file_path` exists and is writable.
///
/// Creates the directory if needed, then writes and removes a scratch file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %file_path))]
pub async fn ensure_writable_parent(file_path: &str) -> Result<(), Box<dyn Error>> {
    let dir = match Path::new(file_path).parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let scratch_path = dir.join("..__write_check__");
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!(dir = %dir.display(), "Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_date() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(display_date(d), "10/18/2026");

        let d = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(display_date(d), "1/5/2025");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        // each char is three bytes
        let s = "भारत";
        let result = truncate_for_log(s, 4);
        assert!(result.starts_with("भ…"));
        assert!(result.contains("(+9 bytes)"));
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("nested/out/index.html");

        ensure_writable_parent(file.to_str().unwrap()).await.unwrap();
        assert!(tmp.path().join("nested/out").is_dir());
        assert!(!tmp.path().join("nested/out/..__write_check__").exists());
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_bare_filename() {
        assert!(ensure_writable_parent("index.html").await.is_ok());
    }
}
