use crate::url::UrlKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persistent crawl history of one seed URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitedUrlRecord {
    /// Normalized seed URL; the primary key
    pub url: UrlKey,

    pub first_visited: DateTime<Utc>,
    pub last_visited: DateTime<Utc>,

    /// Number of crawl attempts, starting at 1
    pub visit_count: u32,

    /// Whether the last attempt succeeded
    pub success: bool,

    /// Number of emails found by the last attempt
    pub emails_found: usize,

    /// Error of the last attempt, if it failed
    #[serde(default)]
    pub error: Option<String>,
}

impl VisitedUrlRecord {
    /// Creates the record of a first crawl attempt
    pub fn first_visit(
        url: UrlKey,
        at: DateTime<Utc>,
        success: bool,
        emails_found: usize,
        error: Option<String>,
    ) -> Self {
        Self {
            url,
            first_visited: at,
            last_visited: at,
            visit_count: 1,
            success,
            emails_found,
            error,
        }
    }

    /// Updates the record for another attempt, keeping `first_visited`
    pub fn revisit(&mut self, at: DateTime<Utc>, success: bool, emails_found: usize, error: Option<String>) {
        self.last_visited = at;
        self.visit_count = self.visit_count.saturating_add(1);
        self.success = success;
        self.emails_found = emails_found;
        self.error = error;
    }
}

/// Aggregate figures over the whole cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_urls: usize,
    pub successful_scrapes: usize,
    pub failed_scrapes: usize,
    pub total_emails_found: usize,
}

impl<'a> FromIterator<&'a VisitedUrlRecord> for CacheStats {
    fn from_iter<I: IntoIterator<Item = &'a VisitedUrlRecord>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut stats, record| {
            stats.total_urls += 1;
            if record.success {
                stats.successful_scrapes += 1;
            } else {
                stats.failed_scrapes += 1;
            }
            stats.total_emails_found += record.emails_found;
            stats
        })
    }
}
