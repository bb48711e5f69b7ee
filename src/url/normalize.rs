use crate::UrlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Canonical identity of a URL
///
/// Two URLs refer to the same resource for caching and dedup purposes iff
/// their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlKey(String);

impl UrlKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Wraps a string that is already in canonical form (e.g. read back from storage)
    pub(crate) fn from_canonical(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for UrlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UrlKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes a URL string to its canonical key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or hostless
/// 2. Lowercase the scheme and host
/// 3. Strip default ports (`:80` on http, `:443` on https)
/// 4. Strip trailing slashes from the path
/// 5. Drop the fragment
///
/// The query string and path casing are left untouched.
///
/// # Examples
///
/// ```
/// use email_scout::url::normalize_url;
///
/// let a = normalize_url("HTTPS://Example.com:443/Path/").unwrap();
/// let b = normalize_url("https://example.com/Path").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "https://example.com/Path");
/// ```
pub fn normalize_url(url_str: &str) -> Result<UrlKey, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", e, url_str)))?;
    normalize_parsed(&url)
}

/// Normalizes an already parsed URL to its canonical key
pub fn normalize_parsed(url: &Url) -> Result<UrlKey, UrlError> {
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| UrlError::MissingHost(url.to_string()))?;

    let mut key = String::with_capacity(url.as_str().len());
    key.push_str(&url.scheme().to_ascii_lowercase());
    key.push_str("://");

    if !url.username().is_empty() {
        key.push_str(url.username());
        if let Some(password) = url.password() {
            key.push(':');
            key.push_str(password);
        }
        key.push('@');
    }

    key.push_str(&host.to_ascii_lowercase());

    // `Url::port` is already None when the port is the scheme default
    if let Some(port) = url.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }

    key.push_str(url.path().trim_end_matches('/'));

    if let Some(query) = url.query() {
        key.push('?');
        key.push_str(query);
    }

    Ok(UrlKey(key))
}
