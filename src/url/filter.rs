use crate::config::LinkConfig;
use crate::url::canonical_domain;
use url::Url;

/// Reason a discovered link is not crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRejection {
    /// Scheme is not http or https
    NonWebScheme,
    /// Canonical domain differs from the site being crawled
    OffSite,
    /// Path ends in an archive, image, audio or video extension
    NonContentExtension,
    /// Path contains an account or commerce segment
    NonContentPath,
}

/// Decides which discovered links a site crawl may follow, and in what order
#[derive(Debug, Clone)]
pub struct LinkFilter {
    skip_extensions: Vec<String>,
    skip_path_segments: Vec<String>,
    priority_keywords: Vec<String>,
}

impl Default for LinkFilter {
    fn default() -> Self {
        Self::new(&LinkConfig::default())
    }
}

impl LinkFilter {
    pub fn new(config: &LinkConfig) -> Self {
        let lower = |items: &[String]| items.iter().map(|s| s.to_lowercase()).collect();
        Self {
            skip_extensions: lower(&config.skip_extensions),
            skip_path_segments: lower(&config.skip_path_segments),
            priority_keywords: lower(&config.priority_keywords),
        }
    }

    /// Checks a resolved link against the site's canonical domain
    ///
    /// # Returns
    ///
    /// * `None` - The link may be crawled
    /// * `Some(LinkRejection)` - Why the link is skipped
    pub fn check(&self, url: &Url, site_domain: &str) -> Option<LinkRejection> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Some(LinkRejection::NonWebScheme);
        }

        if canonical_domain(url).as_deref() != Some(site_domain) {
            return Some(LinkRejection::OffSite);
        }

        let path = url.path().to_lowercase();

        if self.skip_extensions.iter().any(|ext| path.ends_with(ext.as_str())) {
            return Some(LinkRejection::NonContentExtension);
        }

        if self
            .skip_path_segments
            .iter()
            .any(|segment| path.contains(segment.as_str()))
        {
            return Some(LinkRejection::NonContentPath);
        }

        None
    }

    pub fn is_crawlable(&self, url: &Url, site_domain: &str) -> bool {
        self.check(url, site_domain).is_none()
    }

    /// Returns true if the link path suggests a contact or people page
    pub fn is_priority(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        self.priority_keywords
            .iter()
            .any(|keyword| path.contains(keyword.as_str()))
    }

    /// Moves contact-intent links ahead of the rest, keeping relative order
    pub fn prioritize(&self, links: Vec<Url>) -> Vec<Url> {
        let (mut first, rest): (Vec<Url>, Vec<Url>) =
            links.into_iter().partition(|url| self.is_priority(url));
        first.extend(rest);
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_site_page_allowed() {
        let filter = LinkFilter::default();
        assert_eq!(filter.check(&url("https://firm.com/services"), "firm.com"), None);
        assert_eq!(filter.check(&url("http://www.firm.com/a"), "firm.com"), None);
    }

    #[test]
    fn test_non_web_scheme() {
        let filter = LinkFilter::default();
        assert_eq!(
            filter.check(&url("ftp://firm.com/file"), "firm.com"),
            Some(LinkRejection::NonWebScheme)
        );
    }

    #[test]
    fn test_off_site() {
        let filter = LinkFilter::default();
        assert_eq!(
            filter.check(&url("https://other.com/contact"), "firm.com"),
            Some(LinkRejection::OffSite)
        );
        assert_eq!(
            filter.check(&url("https://firm.com.evil.net/"), "firm.com"),
            Some(LinkRejection::OffSite)
        );
    }

    #[test]
    fn test_skip_extensions_case_insensitive() {
        let filter = LinkFilter::default();
        for path in ["/brochure.pdf", "/logo.PNG", "/clip.mp4", "/bundle.zip", "/song.mp3"] {
            let link = url(&format!("https://firm.com{}", path));
            assert_eq!(
                filter.check(&link, "firm.com"),
                Some(LinkRejection::NonContentExtension),
                "{} should be skipped",
                path
            );
        }
    }

    #[test]
    fn test_skip_path_segments() {
        let filter = LinkFilter::default();
        for path in ["/login", "/account/signup", "/cart", "/checkout/step1", "/admin/users"] {
            let link = url(&format!("https://firm.com{}", path));
            assert_eq!(
                filter.check(&link, "firm.com"),
                Some(LinkRejection::NonContentPath),
                "{} should be skipped",
                path
            );
        }
    }

    #[test]
    fn test_priority_keywords() {
        let filter = LinkFilter::default();
        assert!(filter.is_priority(&url("https://firm.com/Contact-Us")));
        assert!(filter.is_priority(&url("https://firm.com/about")));
        assert!(filter.is_priority(&url("https://firm.com/our-team")));
        assert!(!filter.is_priority(&url("https://firm.com/blog")));
    }

    #[test]
    fn test_prioritize_is_stable() {
        let filter = LinkFilter::default();
        let links = vec![
            url("https://firm.com/blog"),
            url("https://firm.com/staff"),
            url("https://firm.com/news"),
            url("https://firm.com/contact"),
        ];
        let ordered: Vec<String> = filter
            .prioritize(links)
            .into_iter()
            .map(|u| u.path().to_string())
            .collect();
        assert_eq!(ordered, vec!["/staff", "/contact", "/blog", "/news"]);
    }

    #[test]
    fn test_custom_lists() {
        let filter = LinkFilter::new(&LinkConfig {
            skip_extensions: vec![".doc".to_string()],
            skip_path_segments: vec!["/shop".to_string()],
            priority_keywords: vec!["impressum".to_string()],
        });
        assert!(filter.is_crawlable(&url("https://firm.de/file.pdf"), "firm.de"));
        assert!(!filter.is_crawlable(&url("https://firm.de/file.doc"), "firm.de"));
        assert!(!filter.is_crawlable(&url("https://firm.de/shop/item"), "firm.de"));
        assert!(filter.is_priority(&url("https://firm.de/impressum")));
    }
}
