use crate::extract::{EmailCandidate, EmailSet};
use crate::url::{normalize_parsed, UrlKey};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Mutable state of one site crawl
///
/// Owned by a single traversal and dropped when it returns. The visited
/// and enqueued sets are keyed by normalized URL, so a page is fetched at
/// most once per crawl however many times it is linked.
#[derive(Debug)]
pub struct TraversalState {
    /// Canonical domain every visited page must share
    domain: String,

    /// Pages waiting to be visited, in visit order
    frontier: VecDeque<(Url, u32)>,

    visited: HashSet<UrlKey>,
    enqueued: HashSet<UrlKey>,
    emails: EmailSet,
    pages_visited: usize,
    pages_failed: usize,
}

impl TraversalState {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            frontier: VecDeque::new(),
            visited: HashSet::new(),
            enqueued: HashSet::new(),
            emails: EmailSet::new(),
            pages_visited: 0,
            pages_failed: 0,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Appends a page to the frontier
    ///
    /// Returns false, without enqueuing, if the URL has no normalized form or
    /// was already enqueued or visited in this crawl.
    pub fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        let Ok(key) = normalize_parsed(&url) else {
            return false;
        };
        if self.is_known(&key) {
            return false;
        }
        self.enqueued.insert(key);
        self.frontier.push_back((url, depth));
        true
    }

    /// Pops the next page to visit
    pub fn pop(&mut self) -> Option<(Url, u32)> {
        self.frontier.pop_front()
    }

    /// Marks a page visited, returning false if it already was
    ///
    /// Each newly visited page counts against the page budget.
    pub fn mark_visited(&mut self, key: UrlKey) -> bool {
        if !self.visited.insert(key) {
            return false;
        }
        self.pages_visited += 1;
        true
    }

    /// Marks the final URL of a redirected fetch visited
    ///
    /// The fetch was already counted under the requested URL, so this does
    /// not count another page. Returns false if the target was already visited.
    pub fn mark_redirect_target(&mut self, key: UrlKey) -> bool {
        self.visited.insert(key)
    }

    /// Returns true if the key was visited or enqueued in this crawl
    pub fn is_known(&self, key: &UrlKey) -> bool {
        self.visited.contains(key) || self.enqueued.contains(key)
    }

    pub fn is_visited(&self, key: &UrlKey) -> bool {
        self.visited.contains(key)
    }

    pub fn pages_visited(&self) -> usize {
        self.pages_visited
    }

    pub fn record_failure(&mut self) {
        self.pages_failed += 1;
    }

    pub fn pages_failed(&self) -> usize {
        self.pages_failed
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Merges page candidates into the site's set
    ///
    /// # Returns
    ///
    /// The number of candidates that were new or raised an address's confidence
    pub fn add_emails(&mut self, candidates: Vec<EmailCandidate>) -> usize {
        let mut changed = 0;
        for candidate in candidates {
            if self.emails.insert(candidate) {
                changed += 1;
            }
        }
        changed
    }

    pub fn emails(&self) -> &EmailSet {
        &self.emails
    }

    pub fn into_emails(self) -> EmailSet {
        self.emails
    }
}
