//! Visited-URL cache
//!
//! Remembers which seed URLs were crawled, across runs. The record set lives
//! in memory behind a read-write lock and every mutation is written through
//! to a [`CacheStore`] before the call returns. Writers are serialized by the
//! lock, so concurrent site crawls never lose each other's updates.
//!
//! A failed save is logged and leaves the cache dirty; the next mutation or
//! an explicit [`VisitedUrlCache::flush`] tries again.

mod record;

pub use record::{CacheStats, VisitedUrlRecord};

use crate::config::CacheConfig;
use crate::storage::{open_store, CacheStore, StorageResult};
use crate::url::{normalize_url, UrlKey};
use crate::UrlResult;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

struct CacheInner {
    records: HashMap<UrlKey, VisitedUrlRecord>,
    store: Box<dyn CacheStore>,
    dirty: bool,
}

impl CacheInner {
    fn sorted_records(&self) -> Vec<VisitedUrlRecord> {
        let mut records: Vec<VisitedUrlRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        records
    }

    fn persist(&mut self) {
        match self.store.save(&self.sorted_records()) {
            Ok(()) => self.dirty = false,
            Err(e) => {
                self.dirty = true;
                warn!(store = %self.store.describe(), error = %e, "Failed to save URL cache, will retry");
            }
        }
    }
}

/// Shared, persistent map from normalized seed URL to crawl history
pub struct VisitedUrlCache {
    inner: RwLock<CacheInner>,
}

impl std::fmt::Debug for VisitedUrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("VisitedUrlCache")
            .field("store", &inner.store.describe())
            .field("records", &inner.records.len())
            .field("dirty", &inner.dirty)
            .finish()
    }
}

impl VisitedUrlCache {
    /// Opens the cache described by the configuration
    pub fn open(config: &CacheConfig) -> Self {
        Self::with_store(open_store(config))
    }

    /// Loads the cache from a store
    ///
    /// An unreadable or corrupt store is logged and treated as empty; the
    /// next save replaces it.
    pub fn with_store(store: Box<dyn CacheStore>) -> Self {
        let records = match store.load() {
            Ok(records) => {
                info!(store = %store.describe(), records = records.len(), "Loaded URL cache");
                records
            }
            Err(e) => {
                warn!(store = %store.describe(), error = %e, "URL cache unreadable, starting empty");
                Vec::new()
            }
        };

        let records = records.into_iter().map(|r| (r.url.clone(), r)).collect();

        Self {
            inner: RwLock::new(CacheInner {
                records,
                store,
                dirty: false,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true if the URL's normalized form has a record
    ///
    /// Unparsable URLs are never visited.
    pub fn is_visited(&self, url: &str) -> bool {
        normalize_url(url).map(|key| self.is_visited_key(&key)).unwrap_or(false)
    }

    pub fn is_visited_key(&self, key: &UrlKey) -> bool {
        self.read().records.contains_key(key)
    }

    /// Records a crawl attempt of a seed URL and persists the cache
    ///
    /// # Errors
    ///
    /// Returns a `UrlError` if the URL cannot be normalized. Persistence
    /// failures are not errors; see the module docs.
    pub fn record_visit(
        &self,
        url: &str,
        success: bool,
        emails_found: usize,
        error: Option<&str>,
    ) -> UrlResult<VisitedUrlRecord> {
        let key = normalize_url(url)?;
        Ok(self.record_visit_key(&key, success, emails_found, error))
    }

    /// Records a crawl attempt of an already normalized seed URL
    pub fn record_visit_key(
        &self,
        key: &UrlKey,
        success: bool,
        emails_found: usize,
        error: Option<&str>,
    ) -> VisitedUrlRecord {
        let now = Utc::now();
        let error = error.map(str::to_string);
        let mut guard = self.write();
        let inner = &mut *guard;

        let record = match inner.records.get_mut(key) {
            Some(record) => {
                record.revisit(now, success, emails_found, error);
                record.clone()
            }
            None => {
                let record = VisitedUrlRecord::first_visit(key.clone(), now, success, emails_found, error);
                inner.records.insert(key.clone(), record.clone());
                record
            }
        };

        debug!(url = %key, visits = record.visit_count, success, "Recorded visit");
        inner.persist();
        record
    }

    /// Returns the record of a URL, if any
    pub fn info(&self, url: &str) -> Option<VisitedUrlRecord> {
        let key = normalize_url(url).ok()?;
        self.info_key(&key)
    }

    pub fn info_key(&self, key: &UrlKey) -> Option<VisitedUrlRecord> {
        self.read().records.get(key).cloned()
    }

    /// Removes the record of a URL, returning true if one existed
    pub fn remove(&self, url: &str) -> bool {
        let Ok(key) = normalize_url(url) else {
            return false;
        };

        let mut inner = self.write();
        if inner.records.remove(&key).is_none() {
            return false;
        }
        info!(url = %key, "Removed URL from cache");
        inner.persist();
        true
    }

    /// Removes every record, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut inner = self.write();
        let removed = inner.records.len();
        inner.records.clear();
        info!(removed, "Cleared URL cache");
        inner.persist();
        removed
    }

    /// Removes records whose last visit is older than `days` days
    ///
    /// # Returns
    ///
    /// The number of records removed
    pub fn cleanup_older_than(&self, days: u32) -> usize {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let mut inner = self.write();
        let before = inner.records.len();
        inner.records.retain(|_, record| record.last_visited >= cutoff);
        let removed = before - inner.records.len();

        if removed > 0 {
            info!(removed, days, "Cleaned up old cache entries");
            inner.persist();
        }
        removed
    }

    /// Returns every record, sorted by normalized URL, for reporting
    pub fn export_snapshot(&self) -> Vec<VisitedUrlRecord> {
        self.read().sorted_records()
    }

    /// Keeps the URLs that have no record, preserving order
    pub fn filter_unvisited<S: AsRef<str>>(&self, urls: &[S]) -> Vec<String> {
        let inner = self.read();
        urls.iter()
            .map(|url| url.as_ref())
            .filter(|url| {
                normalize_url(url)
                    .map(|key| !inner.records.contains_key(&key))
                    .unwrap_or(true)
            })
            .map(str::to_string)
            .collect()
    }

    /// URLs whose last crawl succeeded, sorted
    pub fn successful_urls(&self) -> Vec<UrlKey> {
        self.urls_where(|r| r.success)
    }

    /// URLs whose last crawl failed, sorted
    pub fn failed_urls(&self) -> Vec<UrlKey> {
        self.urls_where(|r| !r.success)
    }

    fn urls_where(&self, predicate: impl Fn(&VisitedUrlRecord) -> bool) -> Vec<UrlKey> {
        let mut urls: Vec<UrlKey> = self
            .read()
            .records
            .values()
            .filter(|r| predicate(r))
            .map(|r| r.url.clone())
            .collect();
        urls.sort();
        urls
    }

    pub fn stats(&self) -> CacheStats {
        self.read().records.values().collect()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    /// Returns true if the last save failed and has not been retried
    pub fn has_unsaved_changes(&self) -> bool {
        self.read().dirty
    }

    /// Saves the cache if the last save failed
    pub fn flush(&self) -> StorageResult<()> {
        let mut inner = self.write();
        if !inner.dirty {
            return Ok(());
        }
        let records = inner.sorted_records();
        inner.store.save(&records)?;
        inner.dirty = false;
        Ok(())
    }

    pub fn describe(&self) -> String {
        self.read().store.describe()
    }
}
