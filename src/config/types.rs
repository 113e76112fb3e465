use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Site-Trawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Site to crawl; its `/sitemap.xml` and `/robots.txt` are consulted first
    #[serde(rename = "base-url", default)]
    pub base_url: String,

    /// Maximum link depth from the seeds (seeds are depth 0)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of fetch attempts in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Reject discovered links whose host differs from the base URL's host
    #[serde(rename = "restrict-to-base-domain", default)]
    pub restrict_to_base_domain: bool,

    /// Minimum time between two fetches to the same host (seconds)
    #[serde(rename = "request-delay-seconds", default = "default_request_delay")]
    pub request_delay_seconds: f64,

    /// User-Agent header and robots.txt identity
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum number of concurrent fetches across distinct hosts
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Bound on connect + read time for any single request (seconds)
    #[serde(rename = "request-timeout-seconds", default = "default_request_timeout")]
    pub request_timeout_seconds: f64,
}

impl CrawlerConfig {
    /// Politeness delay as a Duration
    ///
    /// Values that cannot be represented (negative, NaN, too large) become
    /// zero; validation rejects them before a run starts.
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_delay_seconds).unwrap_or_default()
    }

    /// Per-request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_timeout_seconds).unwrap_or_default()
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            restrict_to_base_domain: false,
            request_delay_seconds: default_request_delay(),
            user_agent: default_user_agent(),
            workers: default_workers(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Newline-delimited list of visited URLs
    #[serde(rename = "urls-path", default = "default_urls_path")]
    pub urls_path: String,

    /// One JSON object per crawled page
    #[serde(rename = "results-path", default)]
    pub results_path: Option<String>,

    /// Flattened extraction payloads as CSV
    #[serde(rename = "csv-path", default)]
    pub csv_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            urls_path: default_urls_path(),
            results_path: None,
            csv_path: None,
        }
    }
}

fn default_max_depth() -> u32 {
    3
}

fn default_max_pages() -> u32 {
    10
}

fn default_request_delay() -> f64 {
    1.0
}

fn default_user_agent() -> String {
    format!("site-trawler/{}", env!("CARGO_PKG_VERSION"))
}

fn default_workers() -> u32 {
    4
}

fn default_request_timeout() -> f64 {
    10.0
}

fn default_urls_path() -> String {
    "crawled_urls.txt".to_string()
}
