//! Crawler module for page fetching and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - The frontier (FIFO queue, deduplication, depth bound)
//! - Per-host politeness throttling
//! - HTTP fetching and link extraction
//! - The scheduler control loop and worker pool

mod fetcher;
mod frontier;
mod parser;
mod scheduler;
mod throttle;

pub use fetcher::{build_http_client, CrawlResult, FetchWorker};
pub use frontier::{CrawlTarget, Frontier};
pub use parser::{parse_html, ParsedPage};
pub use scheduler::CrawlScheduler;
pub use throttle::HostThrottle;

use crate::config::CrawlerConfig;
use crate::extract::HtmlExtractor;
use crate::output::RunOutput;
use crate::TrawlError;
use std::sync::Arc;

/// Runs a complete crawl with the default HTML extractor
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and build the HTTP client
/// 2. Seed the frontier from the sitemap or the base URL
/// 3. Fetch pages and follow links within the depth and page budgets
/// 4. Return the visited URLs, results and statistics
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(RunOutput)` - Crawl finished (individual pages may have failed)
/// * `Err(TrawlError)` - Crawl could not start
pub async fn crawl(config: CrawlerConfig) -> Result<RunOutput, TrawlError> {
    CrawlScheduler::new(config, Arc::new(HtmlExtractor::new()))?
        .run()
        .await
}
