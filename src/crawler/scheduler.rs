//! Crawl scheduler: the top-level control loop
//!
//! This module handles:
//! - Seeding the frontier from the sitemap, or the base URL as fallback
//! - Dispatching ready targets to a bounded pool of fetch tasks
//! - Per-host politeness (one in-flight fetch, delay between fetches)
//! - Feeding discovered links back into the frontier
//! - Cancellation and draining of in-flight fetches
//!
//! Only the dispatch loop touches the frontier and the throttle; fetch tasks
//! communicate back exclusively through their join results.

use crate::config::{validate_crawler_config, CrawlerConfig};
use crate::crawler::fetcher::{build_http_client, CrawlResult, FetchWorker};
use crate::crawler::frontier::{CrawlTarget, Frontier};
use crate::crawler::throttle::HostThrottle;
use crate::extract::Extractor;
use crate::output::{CrawlStats, RunOutput};
use crate::robots::PolicyGate;
use crate::sitemap::SitemapResolver;
use crate::state::RunPhase;
use crate::url::{extract_host, normalize_url, origin_of, UrlNormalizer};
use crate::{FetchError, FetchErrorKind, TrawlError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Progress is logged every this many completed fetches
const PROGRESS_INTERVAL: u32 = 10;

type FetchOutcome = (CrawlTarget, String, Result<CrawlResult, FetchError>);

/// Owns all run-scoped crawl state and drives it to completion
///
/// Construct a fresh scheduler per run; nothing is shared between runs.
///
/// # Example
///
/// ```no_run
/// use site_trawler::config::CrawlerConfig;
/// use site_trawler::extract::HtmlExtractor;
/// use site_trawler::CrawlScheduler;
/// use std::sync::Arc;
///
/// # async fn demo() -> Result<(), site_trawler::TrawlError> {
/// let config = CrawlerConfig {
///     base_url: "https://example.com/".to_string(),
///     ..CrawlerConfig::default()
/// };
/// let output = CrawlScheduler::new(config, Arc::new(HtmlExtractor::new()))?
///     .run()
///     .await?;
/// println!("visited {} pages", output.visited_urls.len());
/// # Ok(())
/// # }
/// ```
pub struct CrawlScheduler {
    config: CrawlerConfig,
    base_url: Url,
    phase: RunPhase,
    frontier: Frontier,
    throttle: HostThrottle,
    gate: Arc<PolicyGate>,
    sitemap: SitemapResolver,
    normalizer: UrlNormalizer,
    worker: FetchWorker,
    results: Vec<CrawlResult>,
    stats: CrawlStats,
}

impl CrawlScheduler {
    /// Creates a scheduler for one run
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlScheduler)` - Ready to run
    /// * `Err(TrawlError)` - Invalid configuration or HTTP client setup failure
    pub fn new(config: CrawlerConfig, extractor: Arc<dyn Extractor>) -> Result<Self, TrawlError> {
        validate_crawler_config(&config)?;

        let base_url = normalize_url(&config.base_url)?;
        let client = build_http_client(&config)?;
        let gate = Arc::new(PolicyGate::new(client.clone()));
        let normalizer = UrlNormalizer::new(&base_url, config.restrict_to_base_domain)?;
        let worker = FetchWorker::new(
            client.clone(),
            Arc::clone(&gate),
            normalizer.clone(),
            extractor,
            config.user_agent.clone(),
            config.request_timeout(),
        );

        Ok(Self {
            frontier: Frontier::new(config.max_depth),
            throttle: HostThrottle::new(config.request_delay()),
            sitemap: SitemapResolver::new(client, config.request_timeout()),
            phase: RunPhase::Seeding,
            results: Vec::new(),
            stats: CrawlStats::default(),
            config,
            base_url,
            gate,
            normalizer,
            worker,
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs the crawl to completion
    pub async fn run(self) -> Result<RunOutput, TrawlError> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Runs the crawl until it finishes or `cancel` fires
    ///
    /// On cancellation no further targets are dispatched, in-flight fetches
    /// are cancelled, and the partial output is returned.
    pub async fn run_with_cancellation(
        mut self,
        cancel: CancellationToken,
    ) -> Result<RunOutput, TrawlError> {
        let start_time = Instant::now();
        tracing::info!(
            "Starting crawl of {} (max depth {}, max pages {}, {} workers)",
            self.base_url,
            self.config.max_depth,
            self.config.max_pages,
            self.config.workers
        );
        if self.normalizer.restricts_to_base_domain() {
            tracing::info!("Only following links on the base URL's host");
        }

        self.seed(&cancel).await;

        let fetch_cancel = cancel.child_token();
        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();

        if cancel.is_cancelled() {
            self.phase.transition(RunPhase::Draining)?;
        } else {
            self.phase.transition(RunPhase::Running)?;
            self.dispatch_loop(&cancel, &fetch_cancel, &mut in_flight, start_time)
                .await;
            self.phase.transition(RunPhase::Draining)?;
        }

        if cancel.is_cancelled() {
            tracing::info!("Crawl cancelled, draining {} in-flight fetches", in_flight.len());
            fetch_cancel.cancel();
        }
        while let Some(joined) = in_flight.join_next().await {
            self.handle_join(joined, start_time);
        }

        self.phase.transition(RunPhase::Done)?;

        self.stats.robots_hosts = self.gate.cached_hosts().await;
        self.stats.set_elapsed(start_time.elapsed());
        tracing::info!(
            "Crawl completed: {} pages crawled ({} ok, {} failed) in {:?}",
            self.stats.pages_crawled,
            self.stats.pages_succeeded,
            self.stats.failed(),
            start_time.elapsed()
        );

        Ok(RunOutput {
            visited_urls: self.frontier.into_visited_urls(),
            results: self.results,
            stats: self.stats,
        })
    }

    /// Fills the frontier with depth-0 targets
    ///
    /// Sitemap URLs are preferred. When the sitemap is missing, empty, or every
    /// URL it lists is rejected, the base URL is used.
    async fn seed(&mut self, cancel: &CancellationToken) {
        let sitemap_url = match origin_of(&self.base_url) {
            Some(origin) => format!("{}/sitemap.xml", origin),
            None => return,
        };

        let listed = tokio::select! {
            _ = cancel.cancelled() => return,
            urls = self.sitemap.resolve(&sitemap_url) => urls,
        };

        let mut seeded = 0;
        for raw in &listed {
            let Some(url) = self.normalizer.normalize(raw, &self.base_url) else {
                tracing::debug!("Skipping sitemap entry {}", raw);
                continue;
            };
            if !self.gate.can_fetch(&self.config.user_agent, &url).await {
                tracing::info!("Sitemap URL {} disallowed by robots.txt", url);
                continue;
            }
            if self.frontier.enqueue(url.to_string(), 0) {
                seeded += 1;
            }
        }
        self.stats.sitemap_seeds = seeded;

        if seeded > 0 {
            tracing::info!("Seeded {} URLs from {}", seeded, sitemap_url);
            return;
        }

        if listed.is_empty() {
            tracing::info!("No usable sitemap at {}, seeding base URL", sitemap_url);
        } else {
            tracing::warn!(
                "All {} sitemap URLs were rejected, seeding base URL",
                listed.len()
            );
        }

        if self
            .gate
            .can_fetch(&self.config.user_agent, &self.base_url)
            .await
        {
            self.frontier.enqueue(self.base_url.to_string(), 0);
        } else {
            tracing::warn!(
                "Base URL {} is disallowed by robots.txt, nothing to crawl",
                self.base_url
            );
        }
    }

    /// Dispatches and collects fetches until the run has nothing left to do
    ///
    /// Returns when the page budget is spent, the frontier is exhausted with
    /// nothing in flight, or `cancel` fires. Fetches still in flight are left
    /// in `in_flight` for the caller to drain.
    async fn dispatch_loop(
        &mut self,
        cancel: &CancellationToken,
        fetch_cancel: &CancellationToken,
        in_flight: &mut JoinSet<FetchOutcome>,
        start_time: Instant,
    ) {
        let workers = self.config.workers as usize;

        while self.phase.accepts_dispatch() {
            if cancel.is_cancelled() {
                break;
            }

            while in_flight.len() < workers && !self.budget_spent() {
                let Some((target, host)) = self.next_ready_target() else {
                    break;
                };
                self.dispatch(target, host, fetch_cancel, in_flight).await;
            }

            if self.budget_spent() {
                tracing::info!("Reached max pages ({})", self.config.max_pages);
                break;
            }

            let wait = if in_flight.len() < workers && !self.frontier.is_empty() {
                self.throttle_wait()
            } else {
                None
            };

            if in_flight.is_empty() {
                if self.frontier.is_empty() {
                    tracing::info!("Frontier is empty, crawl complete");
                    break;
                }
                let Some(wait) = wait else {
                    if self.pending_hosts_stuck() {
                        // Marked busy, yet nothing is running for them
                        tracing::warn!(
                            "{} targets left whose hosts never became ready, stopping",
                            self.frontier.len()
                        );
                        break;
                    }
                    continue;
                };
                tracing::debug!(
                    "No hosts ready, waiting {:?}. Frontier size: {}",
                    wait,
                    self.frontier.len()
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {}
                }
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(joined) = in_flight.join_next() => self.handle_join(joined, start_time),
                _ = tokio::time::sleep(wait.unwrap_or_default()), if wait.is_some() => {}
            }
        }
    }

    fn budget_spent(&self) -> bool {
        self.stats.pages_crawled >= self.config.max_pages
    }

    /// Takes the oldest pending target whose host can accept a request now
    fn next_ready_target(&mut self) -> Option<(CrawlTarget, String)> {
        let now = Instant::now();
        let throttle = &self.throttle;
        let target = self
            .frontier
            .dequeue_where(|target| throttle.is_ready(&host_key(&target.url), now))?;
        let host = host_key(&target.url);
        Some((target, host))
    }

    /// Time until the first throttled pending host becomes ready
    fn throttle_wait(&self) -> Option<Duration> {
        let hosts: Vec<String> = self
            .frontier
            .pending()
            .map(|target| host_key(&target.url))
            .collect();
        self.throttle
            .min_wait(hosts.iter().map(String::as_str), Instant::now())
    }

    /// True if some pending target's host is still marked in flight
    fn pending_hosts_stuck(&self) -> bool {
        self.frontier.pending().any(|target| {
            self.throttle
                .get(&host_key(&target.url))
                .map_or(false, |state| state.in_flight)
        })
    }

    /// Marks `target` visited, counts it, and spawns its fetch
    async fn dispatch(
        &mut self,
        target: CrawlTarget,
        host: String,
        fetch_cancel: &CancellationToken,
        in_flight: &mut JoinSet<FetchOutcome>,
    ) {
        if !self.throttle.knows(&host) {
            let crawl_delay = match Url::parse(&target.url) {
                Ok(url) => self
                    .gate
                    .crawl_delay(&self.config.user_agent, &url)
                    .await
                    .and_then(|secs| crawl_delay_duration(secs, &host)),
                Err(_) => None,
            };
            if let Some(delay) = crawl_delay {
                tracing::debug!("Honouring Crawl-delay of {:?} for {}", delay, host);
            }
            self.throttle.set_crawl_delay(&host, crawl_delay);
        }

        self.frontier.mark_visited(&target.url);
        self.throttle.record_dispatch(&host);
        self.stats.pages_crawled += 1;
        tracing::debug!("Processing URL: {} (depth {})", target.url, target.depth);

        let worker = self.worker.clone();
        let token = fetch_cancel.clone();
        in_flight.spawn(async move {
            let result = worker.fetch(&target.url, target.depth, &token).await;
            (target, host, result)
        });
    }

    fn handle_join(&mut self, joined: Result<FetchOutcome, JoinError>, start_time: Instant) {
        match joined {
            Ok((target, host, result)) => {
                self.throttle.record_completion(&host, Instant::now());
                self.record_outcome(&target, result);
            }
            Err(e) => {
                tracing::error!("Fetch task failed: {}", e);
                self.stats.record_failure(&FetchErrorKind::Network {
                    message: e.to_string(),
                });
            }
        }

        let completed = self.stats.pages_succeeded + self.stats.failed();
        if completed > 0 && completed % PROGRESS_INTERVAL == 0 {
            let elapsed = start_time.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                completed as f64 / elapsed
            } else {
                0.0
            };
            tracing::info!(
                "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                completed,
                self.frontier.len(),
                rate
            );
        }
    }

    fn record_outcome(&mut self, target: &CrawlTarget, result: Result<CrawlResult, FetchError>) {
        match result {
            Ok(result) => {
                let enqueued = self.absorb(&result);
                tracing::debug!(
                    "Fetched {}: {} links, {} new",
                    target.url,
                    result.discovered_links.len(),
                    enqueued
                );
                self.stats
                    .record_success(result.discovered_links.len(), enqueued);
                self.results.push(result);
            }
            Err(e) => {
                match &e.kind {
                    FetchErrorKind::Cancelled => tracing::debug!("Fetch of {} cancelled", e.url),
                    kind => tracing::warn!(
                        error_kind = kind.label(),
                        "Failed to fetch {}: {:?}",
                        e.url,
                        kind
                    ),
                }
                self.stats.record_failure(&e.kind);
            }
        }
    }

    /// Enqueues the links of `result` one level deeper
    ///
    /// Returns how many links were new to the frontier.
    pub fn absorb(&mut self, result: &CrawlResult) -> usize {
        let depth = result.depth + 1;
        result
            .discovered_links
            .iter()
            .filter(|link| self.frontier.enqueue(link.as_str(), depth))
            .count()
    }
}

/// Converts a robots.txt Crawl-delay to a Duration, dropping unusable values
fn crawl_delay_duration(secs: f64, host: &str) -> Option<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(delay) => Some(delay),
        Err(e) => {
            tracing::warn!("Ignoring Crawl-delay of {} for {}: {}", secs, host, e);
            None
        }
    }
}

/// Politeness key for a canonical URL string
fn host_key(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| extract_host(&u))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractionPayload, NoopExtractor};

    fn create_test_config() -> CrawlerConfig {
        CrawlerConfig {
            base_url: "http://example.test/".to_string(),
            max_depth: 2,
            max_pages: 10,
            request_delay_seconds: 0.0,
            ..CrawlerConfig::default()
        }
    }

    fn scheduler(config: CrawlerConfig) -> CrawlScheduler {
        CrawlScheduler::new(config, Arc::new(NoopExtractor)).unwrap()
    }

    fn result(url: &str, depth: u32, links: &[&str]) -> CrawlResult {
        CrawlResult {
            url: url.to_string(),
            depth,
            discovered_links: links.iter().map(|l| l.to_string()).collect(),
            extraction_payload: ExtractionPayload::default(),
        }
    }

    #[test]
    fn test_new_scheduler_starts_seeding() {
        let scheduler = scheduler(create_test_config());
        assert_eq!(scheduler.phase(), RunPhase::Seeding);
        assert!(scheduler.frontier().is_empty());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CrawlerConfig {
            max_pages: 0,
            ..create_test_config()
        };
        assert!(matches!(
            CrawlScheduler::new(config, Arc::new(NoopExtractor)),
            Err(TrawlError::Config(_))
        ));

        let config = CrawlerConfig {
            base_url: "ftp://example.test/".to_string(),
            ..create_test_config()
        };
        assert!(CrawlScheduler::new(config, Arc::new(NoopExtractor)).is_err());
    }

    #[test]
    fn test_absorb_deduplicates_and_increments_depth() {
        let mut scheduler = scheduler(create_test_config());
        scheduler.frontier.enqueue("http://example.test/", 0);
        let root = scheduler.frontier.dequeue().unwrap();
        scheduler.frontier.mark_visited(&root.url);

        let enqueued = scheduler.absorb(&result(
            "http://example.test/",
            0,
            &[
                "http://example.test/a",
                "http://example.test/b",
                "http://example.test/a",
                "http://example.test/",
            ],
        ));

        assert_eq!(enqueued, 2);
        assert!(scheduler.frontier().is_visited("http://example.test/"));
        let pending: Vec<CrawlTarget> = scheduler.frontier().pending().cloned().collect();
        assert_eq!(
            pending,
            vec![
                CrawlTarget {
                    url: "http://example.test/a".to_string(),
                    depth: 1
                },
                CrawlTarget {
                    url: "http://example.test/b".to_string(),
                    depth: 1
                },
            ]
        );
    }

    #[test]
    fn test_absorb_respects_max_depth() {
        let mut scheduler = scheduler(create_test_config());
        let enqueued = scheduler.absorb(&result(
            "http://example.test/deep",
            2,
            &["http://example.test/deeper"],
        ));
        assert_eq!(enqueued, 0);
        assert!(scheduler.frontier().is_empty());
    }

    #[test]
    fn test_crawl_delay_duration() {
        assert_eq!(
            crawl_delay_duration(1.5, "example.test"),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(crawl_delay_duration(1e30, "example.test"), None);
        assert_eq!(crawl_delay_duration(f64::NAN, "example.test"), None);
        assert_eq!(crawl_delay_duration(-1.0, "example.test"), None);
    }

    #[test]
    fn test_new_rejects_oversized_durations() {
        let config = CrawlerConfig {
            request_delay_seconds: 1e30,
            ..create_test_config()
        };
        assert!(matches!(
            CrawlScheduler::new(config, Arc::new(NoopExtractor)),
            Err(TrawlError::Config(_))
        ));

        let config = CrawlerConfig {
            request_timeout_seconds: 1e30,
            ..create_test_config()
        };
        assert!(matches!(
            CrawlScheduler::new(config, Arc::new(NoopExtractor)),
            Err(TrawlError::Config(_))
        ));
    }

    #[test]
    fn test_host_key() {
        assert_eq!(host_key("http://Example.test:8080/a"), "example.test");
        assert_eq!(host_key("not a url"), "not a url");
    }
}
