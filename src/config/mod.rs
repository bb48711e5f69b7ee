//! Configuration module for Email-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section and key is optional; omitted values take their defaults.
//!
//! # Example
//!
//! ```no_run
//! use email_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Crawler will visit up to {} pages per site", config.crawler.max_pages_per_site);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    CacheBackend, CacheConfig, Config, CrawlerConfig, ExtractionConfig, LinkConfig, OutputConfig,
    OutputFormat, UserAgentConfig, DEFAULT_DISPOSABLE_DOMAINS, DEFAULT_EXCLUDE_PATTERNS,
    DEFAULT_PRIORITY_KEYWORDS, DEFAULT_SKIP_EXTENSIONS, DEFAULT_SKIP_PATH_SEGMENTS,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_concurrency, validate_min_confidence, MAX_CONCURRENT_SITES};
