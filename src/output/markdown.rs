//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a run,
//! including site statistics, failures and the email domains found.

use crate::output::traits::{OutputResult, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of a run
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
pub fn write_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let mut md = String::new();

    md.push_str("# Email-Scout Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        summary.duration_seconds,
        summary.duration_seconds as f64 / 60.0
    ));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Sites**: {}\n", summary.sites_total));
    md.push_str(&format!("- **Crawled OK**: {}\n", summary.sites_succeeded));
    md.push_str(&format!("- **Failed**: {}\n", summary.sites_failed));
    md.push_str(&format!("- **Skipped (cached)**: {}\n", summary.sites_from_cache));
    if summary.sites_not_started > 0 {
        md.push_str(&format!("- **Not started**: {}\n", summary.sites_not_started));
    }
    md.push_str(&format!(
        "- **Pages Visited**: {} ({} failed)\n",
        summary.pages_visited, summary.pages_failed
    ));
    md.push_str(&format!("- **Unique Emails**: {}\n", summary.unique_emails));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n\n", summary.success_rate()));

    if !summary.sites.is_empty() {
        md.push_str("## Sites\n\n");
        md.push_str("| Seed | Domain | Pages | Emails | Status |\n");
        md.push_str("|------|--------|-------|--------|--------|\n");
        for site in &summary.sites {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                site.seed_url, site.domain, site.pages_visited, site.emails, site.status
            ));
        }
        md.push('\n');
    }

    if !summary.email_domains.is_empty() {
        md.push_str("## Top 20 Email Domains\n\n");
        md.push_str("| Domain | Addresses |\n");
        md.push_str("|--------|-----------|\n");
        for (domain, count) in summary.email_domains.iter().take(20) {
            md.push_str(&format!("| {} | {} |\n", domain, count));
        }
        md.push('\n');
    }

    if !summary.failures.is_empty() {
        md.push_str("## Failures\n\n");
        for (seed, error) in &summary.failures {
            md.push_str(&format!("- {}: {}\n", seed, error));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_report;
    use tempfile::TempDir;

    #[test]
    fn test_format_markdown_summary() {
        let summary = RunSummary::from_report(&sample_report(), Some("abc123"));
        let markdown = format_markdown_summary(&summary);

        assert!(markdown.starts_with("# Email-Scout Run Summary"));
        assert!(markdown.contains("- **Config Hash**: abc123"));
        assert!(markdown.contains("- **Unique Emails**: 3"));
        assert!(markdown.contains("- **Not started**: 1"));
        assert!(markdown.contains("| https://firm.com | firm.com | 4 | 3 | ok |"));
        assert!(markdown.contains("| firm.com | 2 |"));
        assert!(markdown.contains("- https://down.org: HTTP 503"));
    }

    #[test]
    fn test_empty_sections_omitted() {
        let markdown = format_markdown_summary(&RunSummary::default());
        assert!(markdown.contains("Overall Statistics"));
        assert!(!markdown.contains("## Sites"));
        assert!(!markdown.contains("## Failures"));
        assert!(!markdown.contains("Config Hash"));
    }

    #[test]
    fn test_write_markdown_summary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.md");
        write_markdown_summary(&RunSummary::default(), &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("Run Summary"));
    }
}
