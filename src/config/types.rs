use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Address patterns that are almost always placeholders or asset names
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    r"@example\.(com|org|net)",
    r"@domain\.(com|org|net)",
    r"@test\.(com|org|net)",
    r"@placeholder\.",
    r"@yourdomain\.",
    r"@yourcompany\.",
    r"@email\.(com|org|net)",
    r"\.(png|jpe?g|gif|svg|webp)@",
];

/// Throwaway mailbox providers
pub const DEFAULT_DISPOSABLE_DOMAINS: &[&str] = &[
    "tempmail.com",
    "throwaway.email",
    "guerrillamail.com",
    "mailinator.com",
    "10minutemail.com",
    "trashmail.com",
];

/// File extensions that never carry crawlable page content
pub const DEFAULT_SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".tar", ".gz", ".rar", ".7z", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp",
    ".ico", ".bmp", ".mp3", ".wav", ".ogg", ".mp4", ".avi", ".mov", ".webm", ".exe", ".dmg", ".iso",
];

/// Path fragments of account/commerce pages
pub const DEFAULT_SKIP_PATH_SEGMENTS: &[&str] = &["/login", "/signup", "/cart", "/checkout", "/admin"];

/// Path keywords of pages likely to list contact addresses
pub const DEFAULT_PRIORITY_KEYWORDS: &[&str] = &["contact", "about", "team", "people", "staff"];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Main configuration structure for Email-Scout
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub user_agent: UserAgentConfig,
    pub extraction: ExtractionConfig,
    pub links: LinkConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of pages visited per seed site
    pub max_pages_per_site: usize,

    /// Maximum link depth from the seed page (seed is depth 0)
    pub max_depth: u32,

    /// Timeout for a single page request (seconds)
    pub request_timeout_secs: u64,

    /// Delay between consecutive requests to the same site (milliseconds)
    pub politeness_delay_ms: u64,

    /// Number of sites crawled in parallel
    pub max_concurrent_sites: usize,

    /// Maximum number of links enqueued from one page
    pub max_links_per_page: usize,

    /// Crawl seeds even if the cache says they were already crawled
    pub force_rescrape: bool,

    /// Honor robots.txt rules and crawl delays
    pub respect_robots_txt: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages_per_site: 50,
            max_depth: 3,
            request_timeout_secs: 30,
            politeness_delay_ms: 500,
            max_concurrent_sites: 3,
            max_links_per_page: 10,
            force_rescrape: false,
            respect_robots_txt: true,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "EmailScout".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version (+ContactURL; ContactEmail)`, with the
    /// parenthetical dropped when no contact information is configured.
    pub fn user_agent_string(&self) -> String {
        let base = format!("{}/{}", self.crawler_name, self.crawler_version);
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty() && s != "+")
        .collect();

        if contact.is_empty() {
            base
        } else {
            format!("{} ({})", base, contact.join("; "))
        }
    }
}

/// Email extraction and scoring configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    /// Candidates scoring below this are dropped
    pub min_confidence: f64,

    /// Resolve candidate domains before accepting them
    pub validate_dns: bool,

    /// Capture surrounding text for plain-text matches
    pub include_context: bool,

    /// Characters of context captured on each side of a match
    pub context_window: usize,

    /// Regular expressions; a matching address is rejected
    pub exclude_patterns: Vec<String>,

    /// Domains of throwaway mailbox providers
    pub disposable_domains: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            validate_dns: false,
            include_context: true,
            context_window: 50,
            exclude_patterns: to_strings(DEFAULT_EXCLUDE_PATTERNS),
            disposable_domains: to_strings(DEFAULT_DISPOSABLE_DOMAINS),
        }
    }
}

/// Link filtering and prioritization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LinkConfig {
    pub skip_extensions: Vec<String>,
    pub skip_path_segments: Vec<String>,
    pub priority_keywords: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            skip_extensions: to_strings(DEFAULT_SKIP_EXTENSIONS),
            skip_path_segments: to_strings(DEFAULT_SKIP_PATH_SEGMENTS),
            priority_keywords: to_strings(DEFAULT_PRIORITY_KEYWORDS),
        }
    }
}

/// Durable backend for the visited-URL cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Json,
    Sqlite,
}

/// Visited-URL cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Location of the cache file
    pub path: PathBuf,

    /// Storage format of the cache file
    pub backend: CacheBackend,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("storage/visited_urls.json"),
            backend: CacheBackend::Json,
        }
    }
}

/// Report file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving report files
    pub directory: PathBuf,

    /// Format of the email report
    pub format: OutputFormat,

    /// Also write a markdown summary next to the report
    pub write_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./emails"),
            format: OutputFormat::Json,
            write_summary: true,
        }
    }
}
