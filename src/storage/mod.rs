//! Storage module for persisting the visited-URL cache
//!
//! This module provides the durable backends behind the cache:
//! - A JSON file, replaced atomically on every save (default)
//! - A SQLite database, replaced inside one transaction on every save

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::JsonFileStore;
pub use schema::{get_schema_version, initialize_schema, SCHEMA_VERSION};
pub use sqlite::SqliteStore;
pub use traits::{CacheStore, StorageError, StorageResult};

use crate::config::{CacheBackend, CacheConfig};

/// Creates the backend selected by the cache configuration
///
/// Nothing is read or created until the first load or save.
pub fn open_store(config: &CacheConfig) -> Box<dyn CacheStore> {
    match config.backend {
        CacheBackend::Json => Box::new(JsonFileStore::new(&config.path)),
        CacheBackend::Sqlite => Box::new(SqliteStore::new(&config.path)),
    }
}
