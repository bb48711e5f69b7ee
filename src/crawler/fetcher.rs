//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent
//! - GET requests with redirect following (at most 10 hops)
//! - Content-Type classification
//! - Error classification into page outcomes

use crate::config::UserAgentConfig;
use crate::extract::ContentKind;
use crate::state::PageOutcome;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one page
pub const MAX_REDIRECTS: usize = 10;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched textual content
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// How the body should be scanned
        kind: ContentKind,
        /// Page body content
        body: String,
    },

    /// Page is not textual (Content-Type mismatch)
    ContentMismatch {
        /// Final URL after redirects
        final_url: Url,
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-2xx HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
        /// The page outcome this error maps to
        outcome: PageOutcome,
    },

    /// Network error (connection refused, timeout, redirect loop, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// The page outcome this error maps to
        outcome: PageOutcome,
    },
}

impl FetchResult {
    /// Returns the page outcome this fetch result represents
    pub fn outcome(&self) -> PageOutcome {
        match self {
            Self::Success { .. } => PageOutcome::Processed,
            Self::ContentMismatch { .. } => PageOutcome::ContentMismatch,
            Self::HttpError { outcome, .. } | Self::NetworkError { outcome, .. } => *outcome,
        }
    }

    /// Returns a short description of a failed fetch
    pub fn error_detail(&self) -> Option<String> {
        match self {
            Self::HttpError { status_code, .. } => Some(format!("HTTP {}", status_code)),
            Self::NetworkError { error, .. } => Some(error.clone()),
            _ => None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use email_scout::config::UserAgentConfig;
/// use email_scout::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Classifies a Content-Type header value
///
/// # Returns
///
/// * `Some(ContentKind::Markup)` - HTML or XHTML, or no Content-Type at all
/// * `Some(ContentKind::PlainText)` - Any other `text/*` type
/// * `None` - Anything else (images, PDFs, JSON, ...)
pub fn classify_content_type(content_type: &str) -> Option<ContentKind> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "" | "text/html" | "application/xhtml+xml" => Some(ContentKind::Markup),
        m if m.starts_with("text/") => Some(ContentKind::PlainText),
        _ => None,
    }
}

/// Fetches a page
///
/// # Error Mapping
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | HTTP 404, 410 | DeadLink |
/// | HTTP 429 | RateLimited |
/// | Other non-2xx | Failed |
/// | Timeout | Unreachable |
/// | Connection refused, DNS, TLS | Unreachable |
/// | Redirect loop or chain > 10 | Failed |
/// | Body read error | Failed |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `timeout` - Request timeout for this fetch
pub async fn fetch_page(client: &Client, url: &Url, timeout: Duration) -> FetchResult {
    let response = match client.get(url.clone()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        let outcome = match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => PageOutcome::DeadLink,
            StatusCode::TOO_MANY_REQUESTS => PageOutcome::RateLimited,
            _ => PageOutcome::Failed,
        };
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            outcome,
        };
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let Some(kind) = classify_content_type(&content_type) else {
        return FetchResult::ContentMismatch {
            final_url,
            content_type,
        };
    };

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            kind,
            body,
        },
        Err(e) => classify_error(&e),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            outcome: PageOutcome::Unreachable,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
            outcome: PageOutcome::Unreachable,
        }
    } else if e.is_redirect() {
        FetchResult::NetworkError {
            error: "Too many redirects".to_string(),
            outcome: PageOutcome::Failed,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            outcome: PageOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_http_client(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn test_classify_content_type() {
        assert_eq!(classify_content_type("text/html; charset=utf-8"), Some(ContentKind::Markup));
        assert_eq!(classify_content_type("Application/XHTML+XML"), Some(ContentKind::Markup));
        assert_eq!(classify_content_type(""), Some(ContentKind::Markup));
        assert_eq!(classify_content_type("text/plain"), Some(ContentKind::PlainText));
        assert_eq!(classify_content_type("text/csv"), Some(ContentKind::PlainText));
        assert_eq!(classify_content_type("application/pdf"), None);
        assert_eq!(classify_content_type("image/png"), None);
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html><body>hi</body></html>", "text/html"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        match fetch_page(&client(), &url, Duration::from_secs(5)).await {
            FetchResult::Success { body, kind, status_code, .. } => {
                assert_eq!(status_code, 200);
                assert_eq!(kind, ContentKind::Markup);
                assert!(body.contains("hi"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_status_mapping() {
        let server = MockServer::start().await;
        for (route, status) in [("/gone", 404), ("/slow-down", 429), ("/broken", 500)] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;
        }

        let fetch = |route: &str| {
            let url = Url::parse(&format!("{}{}", server.uri(), route)).unwrap();
            async move { fetch_page(&client(), &url, Duration::from_secs(5)).await.outcome() }
        };

        assert_eq!(fetch("/gone").await, PageOutcome::DeadLink);
        assert_eq!(fetch("/slow-down").await, PageOutcome::RateLimited);
        assert_eq!(fetch("/broken").await, PageOutcome::Failed);
    }

    #[tokio::test]
    async fn test_fetch_content_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "image/png"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/logo", server.uri())).unwrap();
        let result = fetch_page(&client(), &url, Duration::from_secs(5)).await;
        assert_eq!(result.outcome(), PageOutcome::ContentMismatch);
        assert_eq!(result.error_detail(), None);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let result = fetch_page(&client(), &url, Duration::from_millis(200)).await;
        assert_eq!(result.outcome(), PageOutcome::Unreachable);
        assert_eq!(result.error_detail().as_deref(), Some("Request timeout"));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let result = fetch_page(&client(), &url, Duration::from_secs(2)).await;
        assert_eq!(result.outcome(), PageOutcome::Unreachable);
    }
}
