use crate::config::types::{
    CacheConfig, Config, CrawlerConfig, ExtractionConfig, LinkConfig, UserAgentConfig,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Upper bound on parallel site crawls
pub const MAX_CONCURRENT_SITES: usize = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extraction_config(&config.extraction)?;
    validate_link_config(&config.links)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages_per_site < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages-per-site must be >= 1, got {}",
            config.max_pages_per_site
        )));
    }

    if config.max_depth < 1 {
        return Err(ConfigError::Validation(format!(
            "max-depth must be >= 1, got {}",
            config.max_depth
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    validate_concurrency(config.max_concurrent_sites)?;

    if config.max_links_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "max-links-per-page must be >= 1, got {}",
            config.max_links_per_page
        )));
    }

    Ok(())
}

/// Validates a parallel site limit
pub fn validate_concurrency(max_concurrent_sites: usize) -> Result<(), ConfigError> {
    if !(1..=MAX_CONCURRENT_SITES).contains(&max_concurrent_sites) {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-sites must be between 1 and {}, got {}",
            MAX_CONCURRENT_SITES, max_concurrent_sites
        )));
    }
    Ok(())
}

/// Validates a minimum confidence threshold
pub fn validate_min_confidence(min_confidence: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&min_confidence) {
        return Err(ConfigError::Validation(format!(
            "min-confidence must be between 0 and 1, got {}",
            min_confidence
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = config.contact_url.as_deref().filter(|u| !u.is_empty()) {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    if let Some(email) = config.contact_email.as_deref().filter(|e| !e.is_empty()) {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates extraction configuration, including that every pattern compiles
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    validate_min_confidence(config.min_confidence)?;

    for pattern in &config.exclude_patterns {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("exclude pattern '{}': {}", pattern, e))
        })?;
    }

    for domain in &config.disposable_domains {
        validate_domain_string(domain)?;
    }

    Ok(())
}

/// Validates link filter configuration
fn validate_link_config(config: &LinkConfig) -> Result<(), ConfigError> {
    for ext in &config.skip_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::InvalidPattern(format!(
                "skip extension '{}' must look like '.ext'",
                ext
            )));
        }
    }

    if config.skip_path_segments.iter().any(|s| s.is_empty())
        || config.priority_keywords.iter().any(|k| k.is_empty())
    {
        return Err(ConfigError::InvalidPattern(
            "path segments and priority keywords cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates a domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation for the crawler's own contact address
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
