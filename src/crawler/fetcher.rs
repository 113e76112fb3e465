//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for page crawling, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests to fetch page content
//! - Error classification into [`FetchErrorKind`]
//! - Link discovery, normalization and robots.txt filtering

use crate::config::CrawlerConfig;
use crate::crawler::parser::parse_html;
use crate::extract::{ExtractionPayload, Extractor};
use crate::robots::PolicyGate;
use crate::url::{origin_of, UrlNormalizer};
use crate::{FetchError, FetchErrorKind};
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Maximum time allowed to establish a connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of redirects followed for one fetch
const MAX_REDIRECTS: usize = 10;

/// Outcome of one successful page fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    /// The URL that was requested (canonical form)
    pub url: String,

    /// Depth the URL was enqueued at
    pub depth: u32,

    /// Links found on the page that passed normalization and robots.txt,
    /// deduplicated, in document order
    pub discovered_links: Vec<String>,

    /// Structured record produced by the extractor
    pub extraction_payload: ExtractionPayload,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent and request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```
/// use site_trawler::config::CrawlerConfig;
/// use site_trawler::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = config.request_timeout();

    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(CONNECT_TIMEOUT))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches single pages and turns them into [`CrawlResult`]s
///
/// Cloning is cheap; the scheduler hands a clone to every spawned fetch task.
#[derive(Clone)]
pub struct FetchWorker {
    client: Client,
    gate: Arc<PolicyGate>,
    normalizer: UrlNormalizer,
    extractor: Arc<dyn Extractor>,
    user_agent: String,
    timeout: Duration,
}

impl FetchWorker {
    pub fn new(
        client: Client,
        gate: Arc<PolicyGate>,
        normalizer: UrlNormalizer,
        extractor: Arc<dyn Extractor>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            gate,
            normalizer,
            extractor,
            user_agent: user_agent.into(),
            timeout,
        }
    }

    /// Fetches `url` and collects its outgoing links
    ///
    /// # Request Flow
    ///
    /// 1. GET the page (redirects followed, whole response bounded by the timeout)
    /// 2. Reject non-200 statuses and non-HTML content types
    /// 3. Parse anchors, resolve them against the final URL, drop duplicates
    /// 4. Keep only links robots.txt allows
    /// 5. Run the extractor over the body
    ///
    /// Cancelling `cancel` aborts the fetch at any point with
    /// [`FetchErrorKind::Cancelled`].
    ///
    /// # Error Classification
    ///
    /// | Condition | Kind |
    /// |-----------|------|
    /// | Status other than 200 | `HttpStatus { code }` |
    /// | Timeout (connect, read, or overall) | `Timeout` |
    /// | Connection refused, DNS, TLS, truncated body | `Network` |
    /// | Content-Type present and not HTML | `ContentMismatch` |
    pub async fn fetch(
        &self,
        url: &str,
        depth: u32,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::new(url, FetchErrorKind::Cancelled)),
            result = self.fetch_page(url, depth) => result.map_err(|kind| FetchError::new(url, kind)),
        }
    }

    async fn fetch_page(&self, url: &str, depth: u32) -> Result<CrawlResult, FetchErrorKind> {
        let page_url = Url::parse(url).map_err(|e| FetchErrorKind::Network {
            message: format!("invalid URL: {}", e),
        })?;

        let (final_url, body) = tokio::time::timeout(self.timeout, self.download(&page_url))
            .await
            .map_err(|_| FetchErrorKind::Timeout)??;

        let parsed = parse_html(&body);
        if let Some(title) = &parsed.title {
            tracing::trace!("Fetched {} ({})", url, title);
        }

        let discovered_links = self.filter_links(&parsed.hrefs, &final_url).await;
        let extraction_payload = self.extractor.extract(&body, &final_url);

        Ok(CrawlResult {
            url: url.to_string(),
            depth,
            discovered_links,
            extraction_payload,
        })
    }

    /// Performs the GET and returns the final URL and body
    async fn download(&self, url: &Url) -> Result<(Url, String), FetchErrorKind> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchErrorKind::HttpStatus {
                code: status.as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html(content_type) {
                return Err(FetchErrorKind::ContentMismatch {
                    content_type: content_type.to_string(),
                });
            }
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(classify_error)?;
        Ok((final_url, body))
    }

    /// Normalizes hrefs, removes duplicates, and applies robots.txt
    async fn filter_links(&self, hrefs: &[String], base_url: &Url) -> Vec<String> {
        let mut seen = HashSet::new();
        let candidates: Vec<Url> = hrefs
            .iter()
            .filter_map(|href| self.normalizer.normalize(href, base_url))
            .filter(|candidate| seen.insert(candidate.to_string()))
            .collect();

        self.resolve_policies(&candidates).await;

        let mut links = Vec::new();
        for candidate in candidates {
            if self.gate.can_fetch(&self.user_agent, &candidate).await {
                links.push(candidate.to_string());
            }
        }
        links
    }

    /// Loads robots.txt for every distinct origin among `candidates` at once
    ///
    /// A page linking to many slow hosts then costs one robots timeout, not
    /// one per host. Dropping the future aborts the outstanding lookups.
    async fn resolve_policies(&self, candidates: &[Url]) {
        let mut origins = HashSet::new();
        let firsts: Vec<&Url> = candidates
            .iter()
            .filter(|candidate| origin_of(candidate).map_or(false, |o| origins.insert(o)))
            .collect();
        if firsts.len() < 2 {
            return;
        }

        let mut lookups = JoinSet::new();
        for candidate in firsts {
            let gate = Arc::clone(&self.gate);
            let url = candidate.clone();
            lookups.spawn(async move { gate.policy_for(&url).await.is_some() });
        }
        while lookups.join_next().await.is_some() {}
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

fn classify_error(error: reqwest::Error) -> FetchErrorKind {
    if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if error.is_connect() {
        FetchErrorKind::Network {
            message: format!("connection failed: {}", error),
        }
    } else {
        FetchErrorKind::Network {
            message: error.to_string(),
        }
    }
}
