use url::{Host, Url};

/// Extracts the canonical (registrable) domain of a URL
///
/// Uses the public suffix list, so `blog.example.co.uk` and `example.co.uk`
/// share the canonical domain `example.co.uk`. IP-literal hosts, and hosts
/// that have no registrable part (such as `localhost`), use the full host.
///
/// # Returns
///
/// * `Some(String)` - The lowercase canonical domain
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use email_scout::url::canonical_domain;
///
/// let url = Url::parse("https://www.Example.co.uk/path").unwrap();
/// assert_eq!(canonical_domain(&url), Some("example.co.uk".to_string()));
/// ```
pub fn canonical_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) => {
            let host = domain.trim_end_matches('.').to_ascii_lowercase();
            let registrable = psl::domain_str(&host).map(str::to_owned);
            Some(registrable.unwrap_or(host))
        }
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

/// Parses a URL string and extracts its canonical domain
pub fn canonical_domain_str(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(canonical_domain)
}
