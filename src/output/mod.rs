//! Output module for writing run reports and summaries
//!
//! This module handles:
//! - Writing the email report as JSON or CSV
//! - Generating the markdown summary of a run
//! - Displaying and exporting visited-URL cache statistics

mod markdown;
mod stats;
mod traits;

pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use stats::{export_cache_csv, format_cache_stats, print_cache_stats, write_cache_csv};
pub use traits::{OutputError, OutputResult, ReportWriter, RunSummary, SiteSummary};

use crate::config::{OutputConfig, OutputFormat};
use crate::crawler::RunReport;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the markdown summary
pub const SUMMARY_FILE_NAME: &str = "summary.md";

/// Writes the full report as pretty-printed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportWriter;

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_hash: Option<&'a str>,
    summary: RunSummary,
    #[serde(flatten)]
    report: &'a RunReport,
}

impl ReportWriter for JsonReportWriter {
    fn extension(&self) -> &'static str {
        OutputFormat::Json.extension()
    }

    fn write(&self, report: &RunReport, config_hash: Option<&str>, path: &Path) -> OutputResult<()> {
        let document = JsonReport {
            config_hash,
            summary: RunSummary::from_report(report, config_hash),
            report,
        };
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.flush()?;
        Ok(())
    }
}

/// Writes one CSV row per globally unique email
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportWriter;

#[derive(Serialize)]
struct EmailRow<'a> {
    address: &'a str,
    domain: &'a str,
    confidence: f64,
    source_url: &'a str,
    discovered_at: String,
    context: &'a str,
}

impl ReportWriter for CsvReportWriter {
    fn extension(&self) -> &'static str {
        OutputFormat::Csv.extension()
    }

    fn write(&self, report: &RunReport, _config_hash: Option<&str>, path: &Path) -> OutputResult<()> {
        let mut csv = csv::Writer::from_path(path)?;
        for email in &report.emails {
            csv.serialize(EmailRow {
                address: &email.address,
                domain: email.domain(),
                confidence: email.confidence,
                source_url: &email.source_url,
                discovered_at: email.discovered_at.to_rfc3339(),
                context: email.context.as_deref().unwrap_or_default(),
            })?;
        }
        csv.flush()?;
        Ok(())
    }
}

/// Returns the writer for a report format
pub fn writer_for(format: OutputFormat) -> Box<dyn ReportWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonReportWriter),
        OutputFormat::Csv => Box::new(CsvReportWriter),
    }
}

/// Files written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub report: PathBuf,
    pub summary: Option<PathBuf>,
}

/// Writes the report of a run into the configured output directory
///
/// The report is named `emails_<timestamp>.<ext>` after the run's finish
/// time; the markdown summary, when enabled, is `summary.md`. The directory
/// is created if missing.
///
/// # Arguments
///
/// * `report` - The finished run
/// * `config` - Output settings
/// * `config_hash` - Hash of the configuration file, if one was used
pub fn write_report(report: &RunReport, config: &OutputConfig, config_hash: Option<&str>) -> OutputResult<ReportPaths> {
    std::fs::create_dir_all(&config.directory)?;

    let writer = writer_for(config.format);
    let file_name = format!(
        "emails_{}.{}",
        report.finished_at.format("%Y%m%d_%H%M%S"),
        writer.extension()
    );
    let report_path = config.directory.join(file_name);
    writer.write(report, config_hash, &report_path)?;
    info!(path = %report_path.display(), emails = report.emails.len(), "Wrote email report");

    let summary = if config.write_summary {
        let path = config.directory.join(SUMMARY_FILE_NAME);
        write_markdown_summary(&RunSummary::from_report(report, config_hash), &path)?;
        info!(path = %path.display(), "Wrote run summary");
        Some(path)
    } else {
        None
    };

    Ok(ReportPaths {
        report: report_path,
        summary,
    })
}
