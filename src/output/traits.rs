//! Output writer trait and summary types
//!
//! This module defines the trait interface for report writers and the
//! run summary rendered into the markdown file.

use crate::crawler::RunReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes a run report to a file in one format
pub trait ReportWriter {
    /// File extension of the format, without the dot
    fn extension(&self) -> &'static str;

    /// Writes the report to `path`, replacing any existing file
    ///
    /// # Arguments
    ///
    /// * `report` - The finished run
    /// * `config_hash` - Hash of the configuration file, if one was used
    /// * `path` - Destination file
    fn write(&self, report: &RunReport, config_hash: Option<&str>, path: &Path) -> OutputResult<()>;
}

/// One row of the per-site table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSummary {
    pub seed_url: String,
    pub domain: String,
    pub pages_visited: usize,
    pub emails: usize,
    pub status: String,
}

/// Summary statistics for a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub config_hash: Option<String>,

    pub sites_total: usize,
    pub sites_succeeded: usize,
    pub sites_failed: usize,
    pub sites_from_cache: usize,
    pub sites_not_started: usize,

    pub pages_visited: usize,
    pub pages_failed: usize,
    pub unique_emails: usize,

    pub sites: Vec<SiteSummary>,

    /// Seed URL and error of every failed site
    pub failures: Vec<(String, String)>,

    /// Email domains by number of unique addresses, most first
    pub email_domains: Vec<(String, usize)>,
}

impl RunSummary {
    /// Builds a summary from a finished run
    pub fn from_report(report: &RunReport, config_hash: Option<&str>) -> Self {
        let sites = report
            .outcomes
            .iter()
            .map(|outcome| SiteSummary {
                seed_url: outcome.seed_url.clone(),
                domain: outcome.canonical_domain.clone().unwrap_or_default(),
                pages_visited: outcome.pages_visited,
                emails: outcome
                    .cached_emails_found
                    .unwrap_or_else(|| outcome.email_count()),
                status: if outcome.from_cache {
                    "cached".to_string()
                } else if outcome.success {
                    "ok".to_string()
                } else {
                    "failed".to_string()
                },
            })
            .collect();

        let failures = report
            .outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| (o.seed_url.clone(), o.error_detail.clone().unwrap_or_default()))
            .collect();

        let mut by_domain: BTreeMap<String, usize> = BTreeMap::new();
        for email in &report.emails {
            *by_domain.entry(email.domain().to_string()).or_default() += 1;
        }
        let mut email_domains: Vec<(String, usize)> = by_domain.into_iter().collect();
        email_domains.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            started_at: report.started_at,
            finished_at: report.finished_at,
            duration_seconds: report.duration().num_seconds(),
            config_hash: config_hash.map(str::to_string),
            sites_total: report.outcomes.len(),
            sites_succeeded: report.sites_succeeded(),
            sites_failed: report.sites_failed(),
            sites_from_cache: report.sites_from_cache(),
            sites_not_started: report.not_started.len(),
            pages_visited: report.pages_visited(),
            pages_failed: report.outcomes.iter().map(|o| o.pages_failed).sum(),
            unique_emails: report.emails.len(),
            sites,
            failures,
            email_domains,
        }
    }

    /// Share of crawled (not cached) sites that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let crawled = self.sites_succeeded + self.sites_failed;
        if crawled == 0 {
            return 0.0;
        }
        (self.sites_succeeded as f64 / crawled as f64) * 100.0
    }
}
