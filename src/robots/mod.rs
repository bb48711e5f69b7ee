//! Robots.txt handling module
//!
//! Each site crawl fetches robots.txt once from the seed's origin and keeps
//! the resulting policy for the rest of that crawl.

mod parser;

pub use parser::RobotsPolicy;

use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches robots.txt for the origin of `site`
///
/// Any failure (network error, timeout, non-2xx status, unreadable body)
/// yields an allow-all policy.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `site` - Any URL on the site; only its origin is used
/// * `agent` - The crawler's product token
/// * `timeout` - Request timeout
pub async fn fetch_robots(client: &Client, site: &Url, agent: &str, timeout: Duration) -> RobotsPolicy {
    let Ok(robots_url) = site.join("/robots.txt") else {
        return RobotsPolicy::allow_all();
    };

    let response = match client.get(robots_url.clone()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(url = %robots_url, error = %e, "robots.txt unavailable, allowing all");
            return RobotsPolicy::allow_all();
        }
    };

    if !response.status().is_success() {
        debug!(url = %robots_url, status = response.status().as_u16(), "No robots.txt, allowing all");
        return RobotsPolicy::allow_all();
    }

    match response.text().await {
        Ok(body) => RobotsPolicy::from_body(&body, agent),
        Err(e) => {
            debug!(url = %robots_url, error = %e, "Unreadable robots.txt, allowing all");
            RobotsPolicy::allow_all()
        }
    }
}
