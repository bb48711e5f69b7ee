//! Visited-URL cache statistics and export
//!
//! This module provides functionality for displaying cache statistics and
//! exporting the cache as CSV for external reporting.

use crate::cache::{CacheStats, VisitedUrlRecord};
use crate::output::traits::OutputResult;
use std::io::Write;
use std::path::Path;

/// Writes cache records as CSV
///
/// Columns: `url, first_visited, last_visited, visit_count, success,
/// emails_found, error`. Timestamps are RFC 3339; a missing error is an
/// empty field.
pub fn write_cache_csv<W: Write>(records: &[VisitedUrlRecord], writer: W) -> OutputResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Exports cache records to a CSV file
pub fn export_cache_csv(records: &[VisitedUrlRecord], path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_cache_csv(records, std::fs::File::create(path)?)
}

/// Formats cache statistics for the terminal
pub fn format_cache_stats(stats: &CacheStats) -> String {
    let success_rate = if stats.total_urls > 0 {
        (stats.successful_scrapes as f64 / stats.total_urls as f64) * 100.0
    } else {
        0.0
    };

    let mut out = String::from("=== URL Cache Statistics ===\n\n");
    out.push_str(&format!("  Total URLs: {}\n", stats.total_urls));
    out.push_str(&format!("  Successful scrapes: {}\n", stats.successful_scrapes));
    out.push_str(&format!("  Failed scrapes: {}\n", stats.failed_scrapes));
    out.push_str(&format!("  Total emails found: {}\n", stats.total_emails_found));
    out.push_str(&format!("\nSuccess Rate: {:.1}%\n", success_rate));
    out
}

/// Prints cache statistics to stdout
pub fn print_cache_stats(stats: &CacheStats) {
    print!("{}", format_cache_stats(stats));
}
