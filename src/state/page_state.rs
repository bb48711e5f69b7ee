/// Outcome definitions for single pages of a site crawl
///
/// Every page popped from the frontier ends in exactly one of these.
use std::fmt;

/// What happened to a page that the traversal visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    // ===== Success =====
    /// Page was fetched and its content scanned for addresses
    Processed,

    /// Page was fetched but its Content-Type is not textual
    ContentMismatch,

    // ===== Transient page errors =====
    /// Page returned HTTP 404 or 410
    DeadLink,

    /// Page could not be reached (connection refused, DNS failure, TLS error, timeout)
    Unreachable,

    /// Page returned HTTP 429
    RateLimited,

    /// Page failed for other reasons (other status codes, body read errors, redirect loops)
    Failed,

    /// Page is disallowed by robots.txt
    Disallowed,
}

impl PageOutcome {
    /// Returns true if the page was fetched successfully
    ///
    /// A content mismatch is a successful fetch that yields no addresses.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed | Self::ContentMismatch)
    }

    /// Returns the stable string form used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::ContentMismatch => "content_mismatch",
            Self::DeadLink => "dead_link",
            Self::Unreachable => "unreachable",
            Self::RateLimited => "rate_limited",
            Self::Failed => "failed",
            Self::Disallowed => "disallowed",
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(PageOutcome::Processed.is_success());
        assert!(PageOutcome::ContentMismatch.is_success());

        assert!(!PageOutcome::DeadLink.is_success());
        assert!(!PageOutcome::Unreachable.is_success());
        assert!(!PageOutcome::RateLimited.is_success());
        assert!(!PageOutcome::Failed.is_success());
        assert!(!PageOutcome::Disallowed.is_success());
    }

    #[test]
    fn test_string_form() {
        assert_eq!(PageOutcome::DeadLink.as_str(), "dead_link");
        assert_eq!(format!("{}", PageOutcome::RateLimited), "rate_limited");
        assert_eq!(PageOutcome::ContentMismatch.to_string(), "content_mismatch");
    }
}
