//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use site_trawler::config::{CrawlerConfig, OutputConfig};
use site_trawler::extract::{HtmlExtractor, NoopExtractor};
use site_trawler::{CrawlScheduler, RunPhase};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at the mock server
fn create_test_config(server_uri: &str) -> CrawlerConfig {
    CrawlerConfig {
        base_url: format!("{}/", server_uri),
        max_depth: 2,
        max_pages: 10,
        restrict_to_base_domain: false,
        request_delay_seconds: 0.0, // No politeness delay for testing
        user_agent: "TestBot/1.0".to_string(),
        workers: 4,
        request_timeout_seconds: 5.0,
    }
}

/// Builds a page whose body links to each href
fn html_page(title: &str, hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, links
    )
}

/// Mounts an HTML page that must be fetched exactly `times` times
async fn mount_page(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

fn url_set(server_uri: &str, paths: &[&str]) -> HashSet<String> {
    paths
        .iter()
        .map(|p| format!("{}{}", server_uri, p))
        .collect()
}

async fn run(config: CrawlerConfig) -> site_trawler::RunOutput {
    CrawlScheduler::new(config, Arc::new(HtmlExtractor::new()))
        .expect("valid config")
        .run()
        .await
        .expect("crawl completes")
}

#[tokio::test]
async fn test_duplicate_links_visited_once_without_sitemap() {
    let server = MockServer::start().await;
    let uri = server.uri();
    // No sitemap.xml or robots.txt mounted: both answer 404

    mount_page(&server, "/", html_page("Home", &["/a", "/b", "/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &["/"]), 1).await;
    mount_page(&server, "/b", html_page("B", &["/a"]), 1).await;

    let output = run(create_test_config(&uri)).await;

    let visited: HashSet<String> = output.visited_urls.iter().cloned().collect();
    assert_eq!(visited, url_set(&uri, &["/", "/a", "/b"]));
    assert_eq!(output.visited_urls.len(), 3);
    assert_eq!(output.visited_urls[0], format!("{}/", uri));

    let root = format!("{}/", uri);
    for result in &output.results {
        let expected_depth = if result.url == root { 0 } else { 1 };
        assert_eq!(result.depth, expected_depth, "depth of {}", result.url);
    }
    assert_eq!(output.stats.sitemap_seeds, 0);
    assert_eq!(output.stats.pages_crawled, 3);
    assert_eq!(output.stats.pages_succeeded, 3);
}

#[tokio::test]
async fn test_robots_disallowed_paths_never_fetched() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /private/").await;
    mount_page(
        &server,
        "/",
        html_page("Home", &["/public", "/private/secret", "/private/other"]),
        1,
    )
    .await;
    mount_page(&server, "/public", html_page("Public", &["/private/deep"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/deep"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = run(create_test_config(&uri)).await;

    assert!(output.visited_urls.iter().all(|u| !u.contains("/private/")));
    assert_eq!(
        output.visited_urls.iter().cloned().collect::<HashSet<_>>(),
        url_set(&uri, &["/", "/public"])
    );
}

#[tokio::test]
async fn test_sitemap_urls_seeded_at_depth_zero() {
    let server = MockServer::start().await;
    let uri = server.uri();

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{uri}/s1</loc></url>
  <url><loc>{uri}/s2</loc></url>
  <url><loc>{uri}/s3</loc></url>
</urlset>"#
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .mount(&server)
        .await;

    mount_page(&server, "/s1", html_page("S1", &["/deeper"]), 1).await;
    mount_page(&server, "/s2", html_page("S2", &[]), 1).await;
    mount_page(&server, "/s3", html_page("S3", &[]), 1).await;
    // The base URL is not listed in the sitemap, so it is not a seed
    mount_page(&server, "/", html_page("Home", &[]), 0).await;
    // Depth 0 only: links found on seeds are never followed
    mount_page(&server, "/deeper", html_page("Deeper", &[]), 0).await;

    let config = CrawlerConfig {
        max_depth: 0,
        ..create_test_config(&uri)
    };
    let output = run(config).await;

    assert_eq!(output.stats.sitemap_seeds, 3);
    assert_eq!(
        output.visited_urls,
        vec![
            format!("{}/s1", uri),
            format!("{}/s2", uri),
            format!("{}/s3", uri)
        ]
    );
    assert!(output.results.iter().all(|r| r.depth == 0));
}

#[tokio::test]
async fn test_rejected_sitemap_falls_back_to_base_url() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /hidden/").await;
    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{uri}/hidden/one</loc></url>
</urlset>"#
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home", &[]), 1).await;

    let output = run(create_test_config(&uri)).await;

    assert_eq!(output.stats.sitemap_seeds, 0);
    assert_eq!(output.visited_urls, vec![format!("{}/", uri)]);
}

#[tokio::test]
async fn test_robots_server_error_degrades_to_allow_all() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home", &["/private/x"]), 1).await;
    mount_page(&server, "/private/x", html_page("X", &[]), 1).await;

    let output = run(create_test_config(&uri)).await;

    assert_eq!(output.visited_urls.len(), 2);
    assert_eq!(output.stats.failed(), 0);
}

#[tokio::test]
async fn test_unreachable_site_completes_with_failure_recorded() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{}", port);

    let output = run(create_test_config(&uri)).await;

    assert_eq!(output.visited_urls, vec![format!("{}/", uri)]);
    assert!(output.results.is_empty());
    assert_eq!(output.stats.failures.get("network"), Some(&1));
}

#[tokio::test]
async fn test_depth_bound() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_page(&server, "/", html_page("D0", &["/d1"]), 1).await;
    mount_page(&server, "/d1", html_page("D1", &["/d2"]), 1).await;
    mount_page(&server, "/d2", html_page("D2", &["/d3"]), 1).await;
    mount_page(&server, "/d3", html_page("D3", &[]), 0).await;

    let output = run(create_test_config(&uri)).await;

    assert_eq!(output.visited_urls.len(), 3);
    assert!(output.results.iter().all(|r| r.depth <= 2));
    // The link at max depth is reported but never enqueued
    let deepest = output
        .results
        .iter()
        .find(|r| r.url.ends_with("/d2"))
        .unwrap();
    assert_eq!(deepest.discovered_links, vec![format!("{}/d3", uri)]);
}

#[tokio::test]
async fn test_page_budget() {
    let server = MockServer::start().await;
    let uri = server.uri();

    let children: Vec<String> = (1..=9).map(|i| format!("/p{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("Home", &child_refs), 1).await;
    for child in &children {
        Mock::given(method("GET"))
            .and(path(child.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html_page("P", &[]), "text/html"))
            .mount(&server)
            .await;
    }

    let config = CrawlerConfig {
        max_pages: 3,
        ..create_test_config(&uri)
    };
    let output = run(config).await;

    assert_eq!(output.stats.pages_crawled, 3);
    assert_eq!(output.visited_urls.len(), 3);

    let requests = server.received_requests().await.unwrap();
    let page_fetches = requests
        .iter()
        .filter(|r| r.url.path().starts_with("/p") || r.url.path() == "/")
        .count();
    assert_eq!(page_fetches, 3);
}

#[tokio::test]
async fn test_page_failures_do_not_abort_run() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_page(&server, "/", html_page("Home", &["/missing", "/ok", "/doc.pdf"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 8], "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", html_page("Ok", &[]), 1).await;

    let output = run(create_test_config(&uri)).await;

    assert_eq!(output.visited_urls.len(), 4);
    assert_eq!(output.results.len(), 2);
    assert_eq!(output.stats.failures.get("http_status"), Some(&1));
    assert_eq!(output.stats.failures.get("content_mismatch"), Some(&1));
}

#[tokio::test]
async fn test_politeness_delay_between_same_host_fetches() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_page(&server, "/", html_page("Home", &["/a", "/b"]), 1).await;
    mount_page(&server, "/a", html_page("A", &[]), 1).await;
    mount_page(&server, "/b", html_page("B", &[]), 1).await;

    let config = CrawlerConfig {
        request_delay_seconds: 0.3,
        ..create_test_config(&uri)
    };

    let started = Instant::now();
    let output = CrawlScheduler::new(config, Arc::new(NoopExtractor))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(output.visited_urls.len(), 3);
    // Three fetches to one host need at least two full delay intervals
    assert!(started.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn test_crawl_delay_from_robots_is_honoured() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_robots(&server, "User-agent: *\nCrawl-delay: 0.5").await;
    mount_page(&server, "/", html_page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &[]), 1).await;

    let started = Instant::now();
    let output = run(create_test_config(&uri)).await;

    assert_eq!(output.visited_urls.len(), 2);
    assert!(started.elapsed() >= Duration::from_millis(500));
}

#[tokio::test]
async fn test_oversized_crawl_delay_does_not_abort_run() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_robots(&server, "User-agent: *\nCrawl-delay: 1e30").await;
    mount_page(&server, "/", html_page("Home", &[]), 1).await;

    let started = Instant::now();
    let output = run(create_test_config(&uri)).await;

    assert_eq!(output.visited_urls, vec![format!("{}/", uri)]);
    assert_eq!(output.stats.pages_succeeded, 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancellation_drains_in_flight_fetches() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Slow", &["/never"]), "text/html")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let config = CrawlerConfig {
        request_timeout_seconds: 30.0,
        ..create_test_config(&uri)
    };
    let started = Instant::now();
    let output = CrawlScheduler::new(config, Arc::new(HtmlExtractor::new()))
        .unwrap()
        .run_with_cancellation(cancel)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(output.visited_urls, vec![format!("{}/", uri)]);
    assert!(output.results.is_empty());
    assert_eq!(output.stats.failures.get("cancelled"), Some(&1));
}

#[tokio::test]
async fn test_restrict_to_base_domain() {
    let server = MockServer::start().await;
    let uri = server.uri();

    // localhost and 127.0.0.1 reach the same server but are different hosts
    let port = url::Url::parse(&uri).unwrap().port().unwrap();
    let other_host = format!("http://localhost:{}/elsewhere", port);
    mount_page(&server, "/", html_page("Home", &["/local", &other_host]), 1).await;
    mount_page(&server, "/local", html_page("Local", &[]), 1).await;
    mount_page(&server, "/elsewhere", html_page("Elsewhere", &[]), 0).await;

    let config = CrawlerConfig {
        restrict_to_base_domain: true,
        ..create_test_config(&uri)
    };
    let output = run(config).await;

    assert_eq!(
        output.visited_urls.iter().cloned().collect::<HashSet<_>>(),
        url_set(&uri, &["/", "/local"])
    );
}

#[tokio::test]
async fn test_invalid_config_rejected_before_run() {
    let config = CrawlerConfig {
        base_url: "http://example.test/".to_string(),
        max_pages: 0,
        ..CrawlerConfig::default()
    };
    assert!(CrawlScheduler::new(config, Arc::new(NoopExtractor)).is_err());

    let config = CrawlerConfig {
        base_url: "not a url".to_string(),
        ..CrawlerConfig::default()
    };
    assert!(CrawlScheduler::new(config, Arc::new(NoopExtractor)).is_err());
}

#[tokio::test]
async fn test_run_output_written_to_files() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Acme</title><meta name="description" content="Pipes"></head>
           <body><h1>Welcome</h1><a href="/a">A</a></body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(&server, "/a", html_page("A", &[]), 1).await;

    let scheduler = CrawlScheduler::new(create_test_config(&uri), Arc::new(HtmlExtractor::new()))
        .unwrap();
    assert_eq!(scheduler.phase(), RunPhase::Seeding);
    let output = scheduler.run().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let output_config = OutputConfig {
        urls_path: dir.path().join("urls.txt").to_string_lossy().into_owned(),
        results_path: Some(dir.path().join("results.jsonl").to_string_lossy().into_owned()),
        csv_path: Some(dir.path().join("results.csv").to_string_lossy().into_owned()),
    };
    output.write_files(&output_config).unwrap();

    let urls = std::fs::read_to_string(&output_config.urls_path).unwrap();
    assert_eq!(urls.lines().count(), 2);

    let jsonl = std::fs::read_to_string(output_config.results_path.as_ref().unwrap()).unwrap();
    assert_eq!(jsonl.lines().count(), 2);
    assert!(jsonl.contains("\"Acme\""));

    let csv = std::fs::read_to_string(output_config.csv_path.as_ref().unwrap()).unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("url,depth,discovered_links"));
    assert!(header.contains("metadata.title"));
    assert!(csv.contains("Welcome"));
}
