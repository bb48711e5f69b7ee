//! Integration tests for site traversal and extraction
//!
//! These tests use wiremock to create mock HTTP servers and run whole site
//! crawls end-to-end.

use email_scout::config::{ExtractionConfig, UserAgentConfig};
use email_scout::crawler::{build_http_client, CrawlLimits, SiteCrawler};
use email_scout::extract::{ContentKind, EmailExtractor, MAILTO_CONTEXT};
use email_scout::url::{canonical_domain, LinkFilter};
use email_scout::{normalize_url, CrawlOutcome};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates limits suitable for tests: no politeness delay, short timeouts
fn test_limits() -> CrawlLimits {
    CrawlLimits {
        max_pages: 50,
        max_depth: 3,
        request_timeout: Duration::from_secs(5),
        politeness_delay: Duration::ZERO,
        max_links_per_page: 10,
    }
}

fn create_crawler(limits: CrawlLimits) -> SiteCrawler {
    let client = build_http_client(&UserAgentConfig::default(), limits.request_timeout)
        .expect("Failed to build HTTP client");
    let extractor = EmailExtractor::new(&ExtractionConfig::default()).expect("Invalid extraction config");
    SiteCrawler::new(client, extractor, LinkFilter::default(), limits)
}

async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html.to_string(), "text/html"))
        .mount(server)
        .await;
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

fn addresses(outcome: &CrawlOutcome) -> Vec<&str> {
    outcome.emails.iter().map(|e| e.address.as_str()).collect()
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Firm</title></head><body>
            <a href="/products">Products</a>
            <a href="/contact">Contact us</a>
            <p>General: hello@firm.com</p>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/contact",
        r#"<p>Sales: <a href="mailto:sales@firm.com?subject=Hi">write</a></p><p>hello@firm.com</p>"#,
    )
    .await;
    mount_page(&server, "/products", "<p>Nothing to see</p>").await;

    let outcome = create_crawler(test_limits()).crawl_site(&server.uri()).await;

    assert!(outcome.success);
    assert_eq!(outcome.error_detail, None);
    assert_eq!(outcome.pages_visited, 3);
    assert_eq!(outcome.pages_failed, 0);
    assert_eq!(outcome.canonical_domain.as_deref(), Some("127.0.0.1"));
    assert_eq!(addresses(&outcome), vec!["hello@firm.com", "sales@firm.com"]);

    let sales = &outcome.emails[1];
    assert_eq!(sales.context.as_deref(), Some(MAILTO_CONTEXT));
    assert!(sales.source_url.ends_with("/contact"));

    assert_eq!(requested_paths(&server).await, vec!["/", "/contact", "/products"]);
}

#[tokio::test]
async fn test_max_depth_one_never_visits_depth_two() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/level1">one</a>"#).await;
    mount_page(&server, "/level1", r#"<a href="/level2">two</a><p>team@firm.com</p>"#).await;
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>deep@firm.com</p>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let limits = CrawlLimits {
        max_depth: 1,
        ..test_limits()
    };
    let outcome = create_crawler(limits).crawl_site(&server.uri()).await;

    assert!(outcome.success);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(addresses(&outcome), vec!["team@firm.com"]);
}

#[tokio::test]
async fn test_page_budget_bounds_traversal() {
    let server = MockServer::start().await;
    for i in 0..20 {
        mount_page(
            &server,
            &format!("/p{}", i),
            &format!(r#"<a href="/p{}">next</a><a href="/p{}">skip</a>"#, i + 1, i + 2),
        )
        .await;
    }
    mount_page(&server, "/", r#"<a href="/p0">start</a>"#).await;

    let limits = CrawlLimits {
        max_pages: 5,
        max_depth: 50,
        ..test_limits()
    };
    let outcome = create_crawler(limits).crawl_site(&server.uri()).await;

    assert!(outcome.success);
    assert_eq!(outcome.pages_visited, 5);
    assert_eq!(requested_paths(&server).await.len(), 5);
}

#[tokio::test]
async fn test_link_cycles_visit_each_page_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">a</a><a href="/b">b</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/b">b</a><a href="/">home</a><a href="/a/">self</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/a">a</a><a href="/#top">home</a>"#).await;

    let limits = CrawlLimits {
        max_depth: 10,
        ..test_limits()
    };
    let outcome = create_crawler(limits).crawl_site(&server.uri()).await;

    assert_eq!(outcome.pages_visited, 3);
    let mut paths = requested_paths(&server).await;
    paths.sort();
    assert_eq!(paths, vec!["/", "/a", "/b"]);
}

#[tokio::test]
async fn test_redirect_target_not_fetched_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/">Home</a><a href="/#main">Skip</a><p>hello@firm.com</p>"#,
    )
    .await;

    let outcome = create_crawler(test_limits())
        .crawl_site(&format!("{}/old", server.uri()))
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.pages_visited, 1);
    assert_eq!(addresses(&outcome), vec!["hello@firm.com"]);
    assert!(outcome.emails[0].source_url.ends_with('/'));
    assert_eq!(requested_paths(&server).await, vec!["/old", "/"]);
}

#[tokio::test]
async fn test_redirect_onto_visited_page_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/moved">Team</a><p>hello@firm.com</p>"#).await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/"))
        .mount(&server)
        .await;

    let outcome = create_crawler(test_limits()).crawl_site(&server.uri()).await;

    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(addresses(&outcome), vec!["hello@firm.com"]);
    assert_eq!(requested_paths(&server).await, vec!["/", "/moved", "/"]);
}

#[tokio::test]
async fn test_never_leaves_seed_domain() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>other@elsewhere.org</p>", "text/html"))
        .expect(0)
        .mount(&elsewhere)
        .await;

    // Same listener, different host name: a different canonical domain
    let offsite = elsewhere.uri().replace("127.0.0.1", "localhost");
    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="{0}/contact">Partner</a><a href="/about">About</a><a href="{0}/">Home</a>"#,
            offsite
        ),
    )
    .await;
    mount_page(&server, "/about", "<p>about us</p>").await;

    let outcome = create_crawler(test_limits()).crawl_site(&server.uri()).await;
    let seed_domain = canonical_domain(&Url::parse(&server.uri()).unwrap());

    assert_eq!(outcome.pages_visited, 2);
    for request in server.received_requests().await.unwrap() {
        assert_eq!(canonical_domain(&request.url), seed_domain);
    }
}

#[tokio::test]
async fn test_unreachable_seed_fails_cleanly() {
    let limits = CrawlLimits {
        request_timeout: Duration::from_secs(2),
        ..test_limits()
    };
    let outcome = create_crawler(limits).crawl_site("http://127.0.0.1:1/").await;

    assert!(!outcome.success);
    assert_eq!(outcome.pages_visited, 1);
    assert!(outcome.emails.is_empty());
    assert!(outcome.error_detail.is_some());
}

#[tokio::test]
async fn test_seed_timeout_fails_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let limits = CrawlLimits {
        request_timeout: Duration::from_millis(300),
        ..test_limits()
    };
    let outcome = create_crawler(limits).crawl_site(&server.uri()).await;

    assert!(!outcome.success);
    assert_eq!(outcome.error_detail.as_deref(), Some("Request timeout"));
}

#[tokio::test]
async fn test_mailto_outranks_plain_text() {
    let with_link = MockServer::start().await;
    mount_page(&with_link, "/", r#"<a href="mailto:boss@firm.com">Email</a>"#).await;
    let with_text = MockServer::start().await;
    mount_page(&with_text, "/", "<p>Write to boss@firm.com</p>").await;

    let crawler = create_crawler(test_limits());
    let linked = crawler.crawl_site(&with_link.uri()).await;
    let plain = crawler.crawl_site(&with_text.uri()).await;

    assert_eq!(addresses(&linked), vec!["boss@firm.com"]);
    assert_eq!(addresses(&plain), vec!["boss@firm.com"]);
    assert!(linked.emails[0].confidence > plain.emails[0].confidence);
}

#[tokio::test]
async fn test_site_dedup_keeps_highest_confidence() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<p>boss@firm.com</p><a href="/contact">c</a>"#).await;
    mount_page(&server, "/contact", r#"<a href="mailto:BOSS@firm.com">mail</a>"#).await;

    let outcome = create_crawler(test_limits()).crawl_site(&server.uri()).await;

    assert_eq!(addresses(&outcome), vec!["boss@firm.com"]);
    assert_eq!(outcome.emails[0].confidence, 1.0);
    assert!(outcome.emails[0].source_url.ends_with("/contact"));
}

#[test]
fn test_exclusion_patterns_and_threshold() {
    let config = ExtractionConfig {
        exclude_patterns: vec![r"example\.com".to_string(), r"test\.com".to_string()],
        min_confidence: 0.7,
        ..ExtractionConfig::default()
    };
    let extractor = EmailExtractor::new(&config).unwrap();

    let found = extractor.extract(
        "Contact info@example.com or sales@company.org. tech@test.com",
        "https://company.org",
        ContentKind::PlainText,
    );

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].address, "sales@company.org");
}

#[test]
fn test_equivalent_urls_share_a_key() {
    assert_eq!(
        normalize_url("HTTPS://Example.com:443/Path/").unwrap(),
        normalize_url("https://example.com/Path").unwrap()
    );
}

#[test]
fn test_confidence_always_in_unit_range() {
    let config = ExtractionConfig {
        min_confidence: 0.0,
        exclude_patterns: Vec::new(),
        ..ExtractionConfig::default()
    };
    let extractor = EmailExtractor::new(&config).unwrap();

    let html = r#"
        <p>a@b.io x.y.z.very.long.local.part.with.many.dots.indeed@some-very-long-domain-name.example.museum</p>
        <p>tracking1234567@firm.com ab@c.co first.last@university.edu</p>
        <a href="mailto:a@b.io,c@d.gov?cc=e@f.net">all</a>
    "#;
    let found = extractor.extract(html, "https://firm.com", ContentKind::Markup);

    assert!(!found.is_empty());
    for candidate in &found {
        assert!(
            (0.0..=1.0).contains(&candidate.confidence),
            "{} scored {}",
            candidate.address,
            candidate.confidence
        );
    }
}
