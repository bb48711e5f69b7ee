//! Per-site crawl traversal
//!
//! One call to [`SiteCrawler::crawl_site`] walks a single site breadth-first
//! from its seed page, following only same-domain links, until the frontier
//! is empty or the page budget is spent. All traversal state lives in a
//! [`TraversalState`] owned by that call.

use crate::cache::VisitedUrlRecord;
use crate::config::{Config, CrawlerConfig};
use crate::crawler::{build_http_client, fetch_page, parse_html, FetchResult};
use crate::extract::{ContentKind, DomainResolver, EmailCandidate, EmailExtractor, MailDns, SystemDns};
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::state::{PageOutcome, TraversalState};
use crate::url::{canonical_domain, canonical_domain_str, normalize_parsed, LinkFilter};
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Budgets bounding one site crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Maximum number of pages visited, failed fetches included
    pub max_pages: usize,

    /// Maximum link depth; the seed is depth 0
    pub max_depth: u32,

    pub request_timeout: Duration,

    /// Minimum spacing between two fetches of the same site
    pub politeness_delay: Duration,

    /// Maximum number of links enqueued from one page
    pub max_links_per_page: usize,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

impl CrawlLimits {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_pages: config.max_pages_per_site,
            max_depth: config.max_depth,
            request_timeout: config.request_timeout(),
            politeness_delay: config.politeness_delay(),
            max_links_per_page: config.max_links_per_page,
        }
    }
}

/// Result of crawling one seed site
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    /// The seed URL as supplied
    pub seed_url: String,

    /// Registrable domain every visited page belongs to
    pub canonical_domain: Option<String>,

    pub pages_visited: usize,

    /// Visited pages whose fetch failed
    pub pages_failed: usize,

    /// Deduplicated candidates found on this site
    pub emails: Vec<EmailCandidate>,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    /// True if the crawl was skipped because the cache already had the seed
    pub from_cache: bool,

    /// Email count of the cached crawl, for skipped seeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_emails_found: Option<usize>,
}

impl CrawlOutcome {
    /// Outcome of a site crawl that failed before finding anything
    pub fn failed(
        seed_url: impl Into<String>,
        canonical_domain: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            seed_url: seed_url.into(),
            canonical_domain,
            pages_visited: 0,
            pages_failed: 0,
            emails: Vec::new(),
            success: false,
            error_detail: Some(error.into()),
            from_cache: false,
            cached_emails_found: None,
        }
    }

    /// Outcome of a seed skipped because it was already crawled successfully
    pub fn cached(seed_url: impl Into<String>, record: &VisitedUrlRecord) -> Self {
        let seed_url = seed_url.into();
        Self {
            canonical_domain: canonical_domain_str(record.url.as_str()),
            seed_url,
            pages_visited: 0,
            pages_failed: 0,
            emails: Vec::new(),
            success: true,
            error_detail: None,
            from_cache: true,
            cached_emails_found: Some(record.emails_found),
        }
    }

    pub fn email_count(&self) -> usize {
        self.emails.len()
    }
}

/// Crawls single sites for email addresses
///
/// A `SiteCrawler` holds only immutable settings and a shareable HTTP
/// client, so one instance can serve many concurrent site crawls.
#[derive(Debug)]
pub struct SiteCrawler {
    client: Client,
    extractor: EmailExtractor,
    link_filter: LinkFilter,
    limits: CrawlLimits,

    /// Product token for robots.txt; `None` ignores robots.txt
    robots_agent: Option<String>,

    /// Deliverability check for candidate domains; `None` skips it
    mail_dns: Option<Arc<dyn MailDns>>,
}

impl SiteCrawler {
    /// Creates a crawler that ignores robots.txt and skips DNS checks
    pub fn new(client: Client, extractor: EmailExtractor, link_filter: LinkFilter, limits: CrawlLimits) -> Self {
        Self {
            client,
            extractor,
            link_filter,
            limits,
            robots_agent: None,
            mail_dns: None,
        }
    }

    /// Honors robots.txt rules addressed to `agent` (or `*`)
    pub fn with_robots(mut self, agent: impl Into<String>) -> Self {
        self.robots_agent = Some(agent.into());
        self
    }

    /// Drops candidates whose domain cannot receive mail
    pub fn with_mail_check(mut self, dns: Arc<dyn MailDns>) -> Self {
        self.mail_dns = Some(dns);
        self
    }

    /// Builds a crawler from the full configuration
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client or the DNS resolver cannot be built, or an
    /// extraction setting is invalid.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let extractor = EmailExtractor::new(&config.extraction)?;
        let mut crawler = Self::new(
            client,
            extractor,
            LinkFilter::new(&config.links),
            CrawlLimits::from_config(&config.crawler),
        );
        if config.extraction.validate_dns {
            crawler = crawler.with_mail_check(Arc::new(SystemDns::new()?));
        }

        Ok(if config.crawler.respect_robots_txt {
            crawler.with_robots(config.user_agent.crawler_name.clone())
        } else {
            crawler
        })
    }

    /// Crawls one site starting from its seed URL
    ///
    /// Pages are visited in frontier order: the seed first, then links in
    /// the order they were enqueued, contact-like links ahead of the rest on
    /// each page. Failures of pages after the seed are counted and skipped.
    /// If the seed itself cannot be fetched the outcome is a failure with an
    /// empty email set.
    ///
    /// Never panics or returns an error; every problem is reported in the
    /// outcome.
    pub async fn crawl_site(&self, seed: &str) -> CrawlOutcome {
        let seed = seed.trim();
        let seed_url = match Url::parse(seed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => return CrawlOutcome::failed(seed, None, format!("Unsupported scheme: {}", url.scheme())),
            Err(e) => return CrawlOutcome::failed(seed, None, format!("Invalid seed URL: {}", e)),
        };

        let Some(domain) = canonical_domain(&seed_url) else {
            return CrawlOutcome::failed(seed, None, "Seed URL has no host");
        };

        info!(seed = %seed_url, domain = %domain, "Crawling site");

        let robots = match &self.robots_agent {
            Some(agent) => fetch_robots(&self.client, &seed_url, agent, self.limits.request_timeout).await,
            None => RobotsPolicy::allow_all(),
        };
        let delay = robots
            .crawl_delay()
            .map_or(self.limits.politeness_delay, |d| d.max(self.limits.politeness_delay));

        let mut state = TraversalState::new(domain.clone());
        state.enqueue(seed_url.clone(), 0);
        let mut resolver = self.mail_dns.clone().map(DomainResolver::new);
        let mut last_fetch: Option<Instant> = None;

        while state.pages_visited() < self.limits.max_pages {
            let Some((url, depth)) = state.pop() else {
                break;
            };
            let Ok(key) = normalize_parsed(&url) else {
                continue;
            };
            if !state.mark_visited(key.clone()) {
                continue;
            }
            let is_seed = depth == 0;

            if !robots.is_allowed(&url) {
                if is_seed {
                    error!(seed = %seed_url, "Seed disallowed by robots.txt");
                    return Self::seed_failure(seed, domain, "Disallowed by robots.txt");
                }
                debug!(url = %url, outcome = %PageOutcome::Disallowed, "Skipping page");
                continue;
            }

            if let Some(previous) = last_fetch {
                tokio::time::sleep_until(previous + delay).await;
            }

            debug!(url = %url, depth, "Fetching page");
            let fetched = fetch_page(&self.client, &url, self.limits.request_timeout).await;
            last_fetch = Some(Instant::now());

            let (final_url, kind, body) = match fetched {
                FetchResult::Success {
                    final_url, kind, body, ..
                } => (final_url, kind, body),
                FetchResult::ContentMismatch { content_type, .. } => {
                    debug!(url = %url, content_type = %content_type, "Skipping non-text page");
                    continue;
                }
                failure => {
                    let detail = failure.error_detail().unwrap_or_else(|| failure.outcome().to_string());
                    if is_seed {
                        error!(seed = %seed_url, error = %detail, "Seed page failed");
                        return Self::seed_failure(seed, domain, detail);
                    }
                    warn!(url = %url, outcome = %failure.outcome(), error = %detail, "Page failed");
                    state.record_failure();
                    continue;
                }
            };

            if canonical_domain(&final_url).as_deref() != Some(domain.as_str()) {
                let detail = format!("Redirected off-site to {}", final_url);
                if is_seed {
                    error!(seed = %seed_url, error = %detail, "Seed page failed");
                    return Self::seed_failure(seed, domain, detail);
                }
                warn!(url = %url, outcome = %PageOutcome::Failed, error = %detail, "Page failed");
                state.record_failure();
                continue;
            }

            if let Ok(final_key) = normalize_parsed(&final_url) {
                if final_key != key && !state.mark_redirect_target(final_key) {
                    debug!(url = %url, final_url = %final_url, "Redirect target already visited");
                    continue;
                }
            }

            let mut candidates = self.extractor.extract(&body, final_url.as_str(), kind);
            if let Some(resolver) = resolver.as_mut() {
                if !candidates.is_empty() {
                    candidates = resolver.retain_deliverable(candidates).await;
                }
            }
            let added = state.add_emails(candidates);
            debug!(url = %final_url, added, total = state.emails().len(), "Processed page");

            if kind == ContentKind::Markup && depth < self.limits.max_depth {
                let enqueued = self.enqueue_links(&mut state, &body, &final_url, depth, &robots);
                trace!(url = %final_url, enqueued, frontier = state.frontier_len(), "Enqueued links");
            }
        }

        let pages_visited = state.pages_visited();
        let pages_failed = state.pages_failed();
        let emails = state.into_emails().into_vec();
        info!(
            seed = %seed_url,
            pages = pages_visited,
            failed = pages_failed,
            emails = emails.len(),
            "Finished site"
        );

        CrawlOutcome {
            seed_url: seed.to_string(),
            canonical_domain: Some(domain),
            pages_visited,
            pages_failed,
            emails,
            success: true,
            error_detail: None,
            from_cache: false,
            cached_emails_found: None,
        }
    }

    fn seed_failure(seed: &str, domain: String, detail: impl Into<String>) -> CrawlOutcome {
        CrawlOutcome {
            pages_visited: 1,
            pages_failed: 1,
            ..CrawlOutcome::failed(seed, Some(domain), detail)
        }
    }

    /// Enqueues the followable links of a page at `depth + 1`
    ///
    /// Links are filtered, de-duplicated and stripped of anything this crawl
    /// already knows before the contact-first ordering and the per-page cap
    /// are applied.
    fn enqueue_links(
        &self,
        state: &mut TraversalState,
        body: &str,
        page_url: &Url,
        depth: u32,
        robots: &RobotsPolicy,
    ) -> usize {
        let parsed = parse_html(body, page_url);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for link in parsed.links {
            if let Some(reason) = self.link_filter.check(&link, state.domain()) {
                trace!(url = %link, ?reason, "Skipping link");
                continue;
            }
            if !robots.is_allowed(&link) {
                trace!(url = %link, "Skipping link disallowed by robots.txt");
                continue;
            }
            let Ok(key) = normalize_parsed(&link) else {
                continue;
            };
            if state.is_known(&key) || !seen.insert(key) {
                continue;
            }
            links.push(link);
        }

        self.link_filter
            .prioritize(links)
            .into_iter()
            .take(self.limits.max_links_per_page)
            .filter(|link| state.enqueue(link.clone(), depth + 1))
            .count()
    }
}
