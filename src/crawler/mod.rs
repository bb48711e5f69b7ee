//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with error classification
//! - HTML parsing and link extraction
//! - Per-site traversal under page, depth and domain limits
//! - Site scheduling with bounded parallelism

mod fetcher;
mod parser;
mod scheduler;
mod traversal;

pub use fetcher::{build_http_client, classify_content_type, fetch_page, FetchResult, MAX_REDIRECTS};
pub use parser::{parse_html, resolve_link, ParsedPage};
pub use scheduler::{RunReport, SchedulerOptions, ShutdownHandle, SiteScheduler};
pub use traversal::{CrawlLimits, CrawlOutcome, SiteCrawler};

use crate::cache::VisitedUrlCache;
use crate::config::Config;
use std::sync::Arc;

/// Builds a scheduler wired from the full configuration
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `cache` - The visited-URL cache shared by all site crawls
///
/// # Returns
///
/// * `Ok(SiteScheduler)` - Ready to run
/// * `Err(ScoutError)` - The HTTP client or an extraction setting is invalid
///
/// # Example
///
/// ```no_run
/// use email_scout::{config::Config, crawler::build_scheduler, VisitedUrlCache};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let cache = Arc::new(VisitedUrlCache::open(&config.cache));
/// let scheduler = build_scheduler(&config, cache)?;
/// let report = scheduler.run_all(&["https://firm.com"]).await;
/// println!("{} unique emails", report.emails.len());
/// # Ok(())
/// # }
/// ```
pub fn build_scheduler(config: &Config, cache: Arc<VisitedUrlCache>) -> crate::Result<SiteScheduler> {
    let crawler = SiteCrawler::from_config(config)?;
    let scheduler = SiteScheduler::new(crawler, cache, SchedulerOptions::from_config(&config.crawler))?;
    Ok(scheduler)
}
