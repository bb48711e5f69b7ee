use crate::config::ExtractionConfig;
use crate::extract::scoring::{is_well_formed, score};
use crate::extract::{deduplicate, EmailCandidate};
use crate::{ConfigError, ConfigResult};
use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::trace;

const CANDIDATE_PATTERN: &str = r"(?i)\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const EXACT_PATTERN: &str = r"(?i)^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";

/// Context attached to candidates taken from mailto links
pub const MAILTO_CONTEXT: &str = "mailto link";

/// How fetched content should be scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// HTML or XHTML; text nodes and mailto links are scanned
    Markup,
    /// Anything else textual; scanned as is
    PlainText,
}

/// Finds, filters and scores email addresses in page content
#[derive(Debug, Clone)]
pub struct EmailExtractor {
    candidate_pattern: Regex,
    exact_pattern: Regex,
    exclude_patterns: Vec<Regex>,
    disposable_domains: HashSet<String>,
    min_confidence: f64,
    include_context: bool,
    context_window: usize,
}

impl EmailExtractor {
    /// Builds an extractor from the extraction settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if an exclusion pattern does not
    /// compile, or `ConfigError::Validation` if the minimum confidence is
    /// outside [0, 1].
    pub fn new(config: &ExtractionConfig) -> ConfigResult<Self> {
        crate::config::validate_min_confidence(config.min_confidence)?;

        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", pattern, e)))
        };

        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .map(|p| compile(&format!("(?i){}", p)))
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self {
            candidate_pattern: compile(CANDIDATE_PATTERN)?,
            exact_pattern: compile(EXACT_PATTERN)?,
            exclude_patterns,
            disposable_domains: config
                .disposable_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            min_confidence: config.min_confidence,
            include_context: config.include_context,
            context_window: config.context_window,
        })
    }

    /// Extracts candidates from content of the given kind
    pub fn extract(&self, content: &str, source_url: &str, kind: ContentKind) -> Vec<EmailCandidate> {
        match kind {
            ContentKind::Markup => self.extract_from_html(content, source_url),
            ContentKind::PlainText => self.extract_from_text(content, source_url),
        }
    }

    /// Extracts candidates from plain text
    ///
    /// The result is deduplicated by address, highest confidence first seen.
    pub fn extract_from_text(&self, text: &str, source_url: &str) -> Vec<EmailCandidate> {
        let candidates = self
            .candidate_pattern
            .find_iter(text)
            .filter_map(|m| {
                let context = self
                    .include_context
                    .then(|| context_around(text, m.start(), m.end(), self.context_window));
                self.evaluate(&m.as_str().to_lowercase(), source_url, false, context)
            })
            .collect();

        deduplicate(candidates)
    }

    /// Extracts candidates from HTML
    ///
    /// Scans the document's text nodes, joined with spaces, and the targets of
    /// `mailto:` links. Mailto candidates get a confidence boost. Content with
    /// no markup at all is scanned as plain text.
    pub fn extract_from_html(&self, html: &str, source_url: &str) -> Vec<EmailCandidate> {
        if !html.contains('<') {
            return self.extract_from_text(html, source_url);
        }

        let document = Html::parse_document(html);
        let text = document.root_element().text().collect::<Vec<_>>().join(" ");
        let mut candidates = self.extract_from_text(&text, source_url);

        if let Ok(selector) = Selector::parse("a[href]") {
            for href in document.select(&selector).filter_map(|a| a.value().attr("href")) {
                for address in self.mailto_addresses(href) {
                    if let Some(candidate) =
                        self.evaluate(&address, source_url, true, Some(MAILTO_CONTEXT.to_string()))
                    {
                        candidates.push(candidate);
                    }
                }
            }
        }

        deduplicate(candidates)
    }

    /// Applies exclusion, disposable-domain, structural and confidence checks
    fn evaluate(
        &self,
        address: &str,
        source_url: &str,
        from_mailto: bool,
        context: Option<String>,
    ) -> Option<EmailCandidate> {
        if self.exclude_patterns.iter().any(|p| p.is_match(address)) {
            trace!(address, "Excluded by pattern");
            return None;
        }

        let domain = address.rsplit_once('@').map(|(_, d)| d)?;
        if self.disposable_domains.contains(domain) {
            trace!(address, "Disposable domain");
            return None;
        }

        if !is_well_formed(address) {
            trace!(address, "Failed structural validation");
            return None;
        }

        let confidence = score(address, from_mailto);
        if confidence < self.min_confidence {
            trace!(address, confidence, "Below minimum confidence");
            return None;
        }

        Some(EmailCandidate {
            address: address.to_string(),
            source_url: source_url.to_string(),
            discovered_at: Utc::now(),
            confidence,
            context,
        })
    }

    /// Parses the recipients of a mailto href
    fn mailto_addresses(&self, href: &str) -> Vec<String> {
        let href = href.trim();
        let scheme_ok = href
            .get(..7)
            .map(|s| s.eq_ignore_ascii_case("mailto:"))
            .unwrap_or(false);
        if !scheme_ok {
            return Vec::new();
        }

        let recipients = href[7..].split(['?', '&']).next().unwrap_or_default();
        let decoded = urlencoding::decode(recipients)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| recipients.to_string());

        decoded
            .split(',')
            .map(|a| a.trim().to_lowercase())
            .filter(|a| self.exact_pattern.is_match(a))
            .collect()
    }
}

/// Returns up to `window` characters on each side of a match, whitespace collapsed
fn context_around(text: &str, start: usize, end: usize, window: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(window)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(window)
        .map_or(text.len(), |(i, _)| end + i);

    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EmailExtractor {
        EmailExtractor::new(&ExtractionConfig::default()).unwrap()
    }

    fn addresses(candidates: &[EmailCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.address.as_str()).collect()
    }

    #[test]
    fn test_exclusions_and_threshold() {
        let found = extractor().extract_from_text(
            "Contact info@example.com or sales@company.org. tech@test.com",
            "https://company.org",
        );
        assert_eq!(addresses(&found), vec!["sales@company.org"]);
    }

    #[test]
    fn test_lowercased() {
        let found = extractor().extract_from_text("Write to Jane.Doe@Firm.COM", "s");
        assert_eq!(addresses(&found), vec!["jane.doe@firm.com"]);
    }

    #[test]
    fn test_disposable_domain_rejected() {
        let found = extractor().extract_from_text("spam@mailinator.com real@firm.com", "s");
        assert_eq!(addresses(&found), vec!["real@firm.com"]);
    }

    #[test]
    fn test_image_name_rejected() {
        let found = extractor().extract_from_text("sprite icon.png@2x.firm.com here", "s");
        assert!(found.is_empty());
    }

    #[test]
    fn test_below_threshold_dropped() {
        let found = extractor().extract_from_text("id 99999999@firm.io", "s");
        assert!(found.is_empty());
    }

    #[test]
    fn test_context_captured() {
        let found = extractor().extract_from_text("Please reach   our office at office@firm.com today.", "s");
        let context = found[0].context.as_deref().unwrap();
        assert!(context.contains("office@firm.com"));
        assert!(context.contains("reach our office at"));
    }

    #[test]
    fn test_context_window_respected() {
        let config = ExtractionConfig {
            context_window: 3,
            ..ExtractionConfig::default()
        };
        let extractor = EmailExtractor::new(&config).unwrap();
        let found = extractor.extract_from_text("abcdefXYZ hr@firm.com XYZghijk", "s");
        assert_eq!(found[0].context.as_deref(), Some("YZ hr@firm.com XY"));
    }

    #[test]
    fn test_context_disabled() {
        let config = ExtractionConfig {
            include_context: false,
            ..ExtractionConfig::default()
        };
        let extractor = EmailExtractor::new(&config).unwrap();
        let found = extractor.extract_from_text("hr@firm.com", "s");
        assert_eq!(found[0].context, None);
    }

    #[test]
    fn test_context_multibyte_safe() {
        let found = extractor().extract_from_text("ééééé hr@firm.com ü", "s");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_mailto_boosted() {
        let html = r#"<html><body><a href="mailto:boss@firm.com">Email</a></body></html>"#;
        let from_link = extractor().extract_from_html(html, "https://firm.com/contact");
        let from_text = extractor().extract_from_text("boss@firm.com", "https://firm.com/about");

        assert_eq!(from_link.len(), 1);
        assert_eq!(from_link[0].context.as_deref(), Some(MAILTO_CONTEXT));
        assert!(from_link[0].confidence > from_text[0].confidence);
    }

    #[test]
    fn test_mailto_with_query_and_encoding() {
        let html = r#"<a href="MAILTO:Sales%40firm.com,hr@firm.com?subject=Hi&cc=x@firm.com">Mail</a>"#;
        let found = extractor().extract_from_html(html, "s");
        assert_eq!(addresses(&found), vec!["sales@firm.com", "hr@firm.com"]);
    }

    #[test]
    fn test_mailto_outranks_same_page_text() {
        let html = r#"<p>boss@firm.com</p><a href="mailto:boss@firm.com">Mail</a>"#;
        let found = extractor().extract_from_html(html, "s");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].confidence, 1.0);
    }

    #[test]
    fn test_adjacent_elements_do_not_fuse() {
        let html = "<span>team</span><span>@firm.com</span><p>ok@firm.com</p>";
        let found = extractor().extract_from_html(html, "s");
        assert_eq!(addresses(&found), vec!["ok@firm.com"]);
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let html = "<div><p>Reach us: help@firm.com<div></span><<<";
        let found = extractor().extract_from_html(html, "s");
        assert_eq!(addresses(&found), vec!["help@firm.com"]);
    }

    #[test]
    fn test_text_without_markup() {
        let found = extractor().extract("plain help@firm.com", "s", ContentKind::Markup);
        assert_eq!(addresses(&found), vec!["help@firm.com"]);
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let config = ExtractionConfig {
            exclude_patterns: vec!["(unclosed".to_string()],
            ..ExtractionConfig::default()
        };
        assert!(matches!(
            EmailExtractor::new(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_invalid_min_confidence() {
        let config = ExtractionConfig {
            min_confidence: 1.5,
            ..ExtractionConfig::default()
        };
        assert!(matches!(EmailExtractor::new(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_confidence_bounds() {
        let extractor = EmailExtractor::new(&ExtractionConfig {
            min_confidence: 0.0,
            ..ExtractionConfig::default()
        })
        .unwrap();
        let html = r#"a@b.io x1234567890@q.info <a href="mailto:ceo@firm.com">m</a> verylonglocalpartthatgoesonandon@sub.firm.museum"#;
        for c in extractor.extract_from_html(html, "s") {
            assert!((0.0..=1.0).contains(&c.confidence));
        }
    }
}
