//! Robots.txt rules for one site
//!
//! Allow/disallow matching is delegated to the robotstxt crate. Crawl-delay
//! is not part of that matcher, so it is read here.

use robotstxt::DefaultMatcher;
use std::time::Duration;
use url::Url;

/// Longest crawl delay honored; larger values are capped
const MAX_CRAWL_DELAY_SECS: f64 = 60.0;

/// Robots.txt rules that apply to one crawler on one site
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt body; empty means allow everything
    body: String,

    /// Product token matched against User-agent lines
    agent: String,
}

impl RobotsPolicy {
    /// Creates a policy from a robots.txt body
    ///
    /// # Arguments
    ///
    /// * `body` - The raw robots.txt content
    /// * `agent` - The crawler's product token (e.g. "EmailScout")
    pub fn from_body(body: &str, agent: &str) -> Self {
        Self {
            body: body.to_string(),
            agent: agent.to_string(),
        }
    }

    /// Creates a policy that allows everything
    ///
    /// Used when robots.txt is missing, unreachable, or not honored.
    pub fn allow_all() -> Self {
        Self {
            body: String::new(),
            agent: String::new(),
        }
    }

    pub fn is_allow_all(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Checks if the crawler may fetch the URL
    pub fn is_allowed(&self, url: &Url) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.body, &self.agent, url.as_str())
    }

    /// Gets the crawl delay that applies to this crawler
    ///
    /// A group naming the crawler takes precedence over the `*` group.
    /// Consecutive User-agent lines share the directives that follow them.
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - The delay, capped at one minute
    /// * `None` - If no applicable Crawl-delay is present
    pub fn crawl_delay(&self) -> Option<Duration> {
        if self.is_allow_all() {
            return None;
        }

        let agent = self.agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut for_agent = None;
        let mut for_wildcard = None;

        for line in self.body.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                if !in_agent_lines {
                    group.clear();
                }
                group.push(value.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(seconds) = value.parse::<f64>() else {
                continue;
            };
            if !seconds.is_finite() || seconds < 0.0 {
                continue;
            }

            if !agent.is_empty() && group.iter().any(|ua| ua != "*" && agent.starts_with(ua.as_str())) {
                for_agent = Some(seconds);
            } else if group.iter().any(|ua| ua == "*") {
                for_wildcard = Some(seconds);
            }
        }

        for_agent
            .or(for_wildcard)
            .map(|s| Duration::from_secs_f64(s.min(MAX_CRAWL_DELAY_SECS)))
    }
}
