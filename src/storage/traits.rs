//! Storage traits and error types
//!
//! This module defines the trait interface for durable cache backends and
//! associated error types.

use crate::cache::VisitedUrlRecord;
use std::fmt::Debug;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for durable visited-URL cache backends
///
/// A backend loads and saves the whole record set at once. Implementations
/// must make `save` atomic: after a crash, `load` sees either the previous
/// or the new record set, never a mix.
pub trait CacheStore: Debug + Send + Sync {
    /// Loads every stored record
    ///
    /// A store that does not exist yet loads as empty. Records that cannot
    /// be read individually are skipped; an unreadable store is an error.
    fn load(&self) -> StorageResult<Vec<VisitedUrlRecord>>;

    /// Replaces the stored record set
    fn save(&self, records: &[VisitedUrlRecord]) -> StorageResult<()>;

    /// Human-readable location of the store, for logs
    fn describe(&self) -> String;
}
