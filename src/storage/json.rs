//! JSON file storage implementation
//!
//! The whole cache is one JSON object keyed by normalized URL. Saves go to a
//! temporary file in the same directory which is then renamed over the
//! target, so readers never observe a half-written file.

use crate::cache::VisitedUrlRecord;
use crate::storage::traits::{CacheStore, StorageResult};
use crate::url::normalize_url;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

/// JSON file cache backend
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl CacheStore for JsonFileStore {
    fn load(&self) -> StorageResult<Vec<VisitedUrlRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: BTreeMap<String, VisitedUrlRecord> = serde_json::from_str(&content)?;

        let mut records = Vec::with_capacity(entries.len());
        for (key, mut record) in entries {
            match normalize_url(&key) {
                Ok(url) => {
                    record.url = url;
                    records.push(record);
                }
                Err(e) => warn!(path = %self.path.display(), key, error = %e, "Skipping cache entry"),
            }
        }
        Ok(records)
    }

    fn save(&self, records: &[VisitedUrlRecord]) -> StorageResult<()> {
        let directory = self.directory();
        fs::create_dir_all(&directory)?;

        let entries: BTreeMap<&str, &VisitedUrlRecord> =
            records.iter().map(|r| (r.url.as_str(), r)).collect();

        let mut temp = NamedTempFile::new_in(&directory)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &entries)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(url: &str) -> VisitedUrlRecord {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        VisitedUrlRecord {
            url: normalize_url(url).unwrap(),
            first_visited: at,
            last_visited: at,
            visit_count: 1,
            success: true,
            emails_found: 4,
            error: None,
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("visited.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_directories_and_loads_back() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("a/b/visited.json"));
        store.save(&[record("https://b.com"), record("https://a.com")]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].url.as_str(), "https://a.com");
        assert_eq!(loaded[0], record("https://a.com"));
    }

    #[test]
    fn test_file_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.json");
        JsonFileStore::new(&path).save(&[record("https://firm.com")]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &value["https://firm.com"];
        assert_eq!(entry["visit_count"], 1);
        assert_eq!(entry["success"], true);
        assert_eq!(entry["emails_found"], 4);
        assert!(entry["first_visited"].as_str().unwrap().starts_with("2024-03-01T12:00:00"));
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.json");
        fs::write(&path, "{ \"https://a.com\": { truncated").unwrap();
        assert!(matches!(JsonFileStore::new(&path).load(), Err(StorageError::Json(_))));
    }

    #[test]
    fn test_keys_are_normalized_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.json");
        fs::write(
            &path,
            r#"{"HTTPS://Firm.com:443/": {"url": "HTTPS://Firm.com:443/", "first_visited": "2024-01-01T00:00:00Z",
                "last_visited": "2024-01-02T00:00:00Z", "visit_count": 2, "success": false,
                "emails_found": 0, "error": "timeout"},
               "not a url": {"url": "x", "first_visited": "2024-01-01T00:00:00Z",
                "last_visited": "2024-01-01T00:00:00Z", "visit_count": 1, "success": true,
                "emails_found": 0}}"#,
        )
        .unwrap();

        let loaded = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url.as_str(), "https://firm.com");
        assert_eq!(loaded[0].error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("visited.json"));
        store.save(&[record("https://a.com")]).unwrap();
        store.save(&[record("https://b.com")]).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("visited.json")]);
    }
}
