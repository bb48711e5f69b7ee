//! Site scheduler: runs many site crawls with bounded parallelism
//!
//! This module handles:
//! - Skipping seeds the visited-URL cache already crawled successfully
//! - Global concurrency limiting via a semaphore
//! - Recording every finished crawl in the cache
//! - Draining in-flight crawls on shutdown
//! - Deduplicating emails across all sites

use crate::cache::VisitedUrlCache;
use crate::config::{validate_concurrency, CrawlerConfig};
use crate::crawler::{CrawlOutcome, SiteCrawler};
use crate::extract::{EmailCandidate, EmailSet};
use crate::url::normalize_url;
use crate::ConfigResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Scheduling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Maximum number of site crawls running at once
    pub max_concurrent: usize,

    /// Crawl seeds even if the cache holds a successful record for them
    pub force_rescrape: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

impl SchedulerOptions {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent_sites,
            force_rescrape: config.force_rescrape,
        }
    }
}

/// Requests a clean stop of a running scheduler
///
/// Seeds not yet dispatched are left alone; crawls already running finish
/// and are recorded in the cache.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Everything one scheduler run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// One outcome per distinct seed, in seed order
    pub outcomes: Vec<CrawlOutcome>,

    /// Emails deduplicated across all sites
    pub emails: Vec<EmailCandidate>,

    /// Seeds skipped because of a shutdown request
    pub not_started: Vec<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Sites crawled during this run that succeeded
    pub fn sites_succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success && !o.from_cache).count()
    }

    pub fn sites_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    pub fn sites_from_cache(&self) -> usize {
        self.outcomes.iter().filter(|o| o.from_cache).count()
    }

    pub fn pages_visited(&self) -> usize {
        self.outcomes.iter().map(|o| o.pages_visited).sum()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs site crawls for a list of seeds
#[derive(Debug)]
pub struct SiteScheduler {
    crawler: Arc<SiteCrawler>,
    cache: Arc<VisitedUrlCache>,
    options: SchedulerOptions,
    shutdown: Arc<watch::Sender<bool>>,
}

impl SiteScheduler {
    /// Creates a scheduler
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `max_concurrent` is zero or above
    /// the supported limit.
    pub fn new(crawler: SiteCrawler, cache: Arc<VisitedUrlCache>, options: SchedulerOptions) -> ConfigResult<Self> {
        validate_concurrency(options.max_concurrent)?;
        let (sender, _) = watch::channel(false);

        Ok(Self {
            crawler: Arc::new(crawler),
            cache,
            options,
            shutdown: Arc::new(sender),
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: Arc::clone(&self.shutdown),
        }
    }

    /// Crawls every seed and collects the results
    ///
    /// Seeds are de-duplicated by normalized URL, first occurrence wins.
    /// Unparsable seeds yield a failed outcome and are not cached. A seed
    /// with a successful cache record yields a cached outcome without any
    /// network traffic unless `force_rescrape` is set.
    ///
    /// Outcomes keep seed order whatever order the crawls finish in, so the
    /// global email set is reproducible. Site failures never abort the run.
    pub async fn run_all<S: AsRef<str>>(&self, seeds: &[S]) -> RunReport {
        let started_at = Utc::now();
        let mut slots: Vec<Option<CrawlOutcome>> = Vec::new();
        let mut pending = Vec::new();
        let mut seen = HashSet::new();

        for seed in seeds {
            let seed = seed.as_ref().trim();
            if seed.is_empty() {
                continue;
            }

            let key = match normalize_url(seed) {
                Ok(key) => key,
                Err(e) => {
                    warn!(seed, error = %e, "Skipping invalid seed");
                    slots.push(Some(CrawlOutcome::failed(seed, None, e.to_string())));
                    continue;
                }
            };

            if !seen.insert(key.clone()) {
                debug!(seed, "Skipping duplicate seed");
                continue;
            }

            if !self.options.force_rescrape {
                if let Some(record) = self.cache.info_key(&key).filter(|r| r.success) {
                    info!(seed, emails = record.emails_found, "Already crawled, skipping");
                    slots.push(Some(CrawlOutcome::cached(seed, &record)));
                    continue;
                }
            }

            pending.push((slots.len(), seed.to_string(), key));
            slots.push(None);
        }

        info!(
            seeds = slots.len(),
            to_crawl = pending.len(),
            max_concurrent = self.options.max_concurrent,
            "Starting site crawls"
        );

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent));
        let mut shutdown = self.shutdown.subscribe();
        let mut tasks = JoinSet::new();
        let mut dispatched = Vec::new();
        let mut not_started = Vec::new();
        let mut queue = pending.into_iter();

        while let Some((index, seed, key)) = queue.next() {
            let permit = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                not_started.push(seed);
                not_started.extend(queue.by_ref().map(|(_, seed, _)| seed));
                warn!(not_started = not_started.len(), "Shutdown requested, draining running crawls");
                break;
            };

            dispatched.push((index, seed.clone()));
            let crawler = Arc::clone(&self.crawler);
            let cache = Arc::clone(&self.cache);

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = crawler.crawl_site(&seed).await;

                // The cache saves to disk on every record
                let (success, emails_found) = (outcome.success, outcome.email_count());
                let detail = outcome.error_detail.clone();
                let recorded = tokio::task::spawn_blocking(move || {
                    cache.record_visit_key(&key, success, emails_found, detail.as_deref());
                })
                .await;
                if let Err(e) = recorded {
                    error!(seed = %outcome.seed_url, error = %e, "Failed to record site visit");
                }
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!(error = %e, "Site crawl task failed"),
            }
        }

        for (index, seed) in dispatched {
            if slots[index].is_none() {
                slots[index] = Some(CrawlOutcome::failed(seed, None, "Site crawl aborted"));
            }
        }

        if let Err(e) = self.cache.flush() {
            error!(cache = %self.cache.describe(), error = %e, "Failed to save URL cache");
        }

        let outcomes: Vec<CrawlOutcome> = slots.into_iter().flatten().collect();
        let emails: EmailSet = outcomes
            .iter()
            .flat_map(|outcome| outcome.emails.iter().cloned())
            .collect();

        let report = RunReport {
            outcomes,
            emails: emails.into_vec(),
            not_started,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            succeeded = report.sites_succeeded(),
            failed = report.sites_failed(),
            cached = report.sites_from_cache(),
            pages = report.pages_visited(),
            emails = report.emails.len(),
            "Run complete"
        );

        report
    }
}

/// Resolves once shutdown has been triggered
async fn shutdown_requested(receiver: &mut watch::Receiver<bool>) {
    if receiver.wait_for(|triggered| *triggered).await.is_err() {
        std::future::pending::<()>().await;
    }
}
