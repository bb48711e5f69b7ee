//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CacheStore trait.
//! A connection is opened per operation, so the store itself is plain data and
//! a damaged database file only fails the operation that touches it.

use crate::cache::VisitedUrlRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CacheStore, StorageError, StorageResult};
use crate::url::UrlKey;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// SQLite cache backend
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Creates a store backed by the database file at `path`
    ///
    /// The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StorageResult<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(conn)
    }
}

impl CacheStore for SqliteStore {
    fn load(&self) -> StorageResult<Vec<VisitedUrlRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT url, first_visited, last_visited, visit_count, success, emails_found, error
             FROM visited_urls ORDER BY url",
        )?;

        let rows = stmt.query_map([], |row| Ok(read_record(row)))?;

        let mut records = Vec::new();
        for row in rows {
            match row? {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %self.path.display(), error = %e, "Skipping unreadable cache row"),
            }
        }
        Ok(records)
    }

    fn save(&self, records: &[VisitedUrlRecord]) -> StorageResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM visited_urls", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO visited_urls
                 (url, first_visited, last_visited, visit_count, success, emails_found, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in records {
                let emails_found = i64::try_from(record.emails_found).unwrap_or(i64::MAX);
                insert.execute(params![
                    record.url.as_str(),
                    record.first_visited.to_rfc3339(),
                    record.last_visited.to_rfc3339(),
                    record.visit_count,
                    record.success,
                    emails_found,
                    record.error,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

/// Converts one row, reporting bad values as a corrupt record
fn read_record(row: &Row<'_>) -> StorageResult<VisitedUrlRecord> {
    let url: String = row.get(0)?;
    let first_visited: String = row.get(1)?;
    let last_visited: String = row.get(2)?;
    let emails_found: i64 = row.get(5)?;

    Ok(VisitedUrlRecord {
        url: UrlKey::from_canonical(url.clone()),
        first_visited: parse_timestamp(&url, &first_visited)?,
        last_visited: parse_timestamp(&url, &last_visited)?,
        visit_count: row.get(3)?,
        success: row.get(4)?,
        emails_found: usize::try_from(emails_found)
            .map_err(|_| StorageError::CorruptRecord(format!("{}: negative email count", url)))?,
        error: row.get(6)?,
    })
}

fn parse_timestamp(url: &str, value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRecord(format!("{}: bad timestamp {:?}: {}", url, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(url: &str, success: bool) -> VisitedUrlRecord {
        let now = Utc::now();
        VisitedUrlRecord {
            url: crate::url::normalize_url(url).unwrap(),
            first_visited: now,
            last_visited: now,
            visit_count: 2,
            success,
            emails_found: 3,
            error: (!success).then(|| "HTTP 500".to_string()),
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::new(dir.path().join("cache.db"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::new(dir.path().join("nested/cache.db"));
        let records = vec![record("https://b.com", true), record("https://a.com", false)];

        store.save(&records).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].url.as_str(), "https://a.com");
        assert_eq!(loaded[0].error.as_deref(), Some("HTTP 500"));
        assert_eq!(loaded[1].visit_count, 2);
        assert_eq!(loaded[1].emails_found, 3);
        assert_eq!(
            loaded[1].first_visited.timestamp(),
            records[0].first_visited.timestamp()
        );
    }

    #[test]
    fn test_save_replaces_previous_set() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::new(dir.path().join("cache.db"));

        store.save(&[record("https://a.com", true), record("https://b.com", true)]).unwrap();
        store.save(&[record("https://c.com", true)]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url.as_str(), "https://c.com");
    }

    #[test]
    fn test_bad_row_skipped() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::new(dir.path().join("cache.db"));
        store.save(&[record("https://a.com", true)]).unwrap();

        let conn = store.connect().unwrap();
        conn.execute(
            "INSERT INTO visited_urls VALUES ('https://bad.com', 'yesterday', 'today', 1, 1, 0, NULL)",
            [],
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_not_a_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.db");
        std::fs::write(&path, "not a database\n".repeat(512)).unwrap();
        assert!(SqliteStore::new(&path).load().is_err());
    }
}
