//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! The [`PolicyGate`] answers fetch-permission queries and owns the per-host cache.

mod cache;
mod parser;

pub use cache::RobotsPolicy;
pub use parser::{product_token, ParsedRobots, MAX_CRAWL_DELAY_SECS};

use crate::url::{extract_host, origin_of};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use url::Url;

type PolicyCell = Arc<OnceCell<Arc<RobotsPolicy>>>;

/// Resolves and caches robots.txt rules per host
///
/// The first query for a host fetches `{scheme}://{host}/robots.txt`;
/// concurrent queries for the same host wait on that single fetch instead of
/// issuing their own. Entries are kept for the lifetime of the gate.
///
/// If robots.txt cannot be obtained (network failure, server error, body
/// that cannot be read) the host degrades to allow-all and a warning is logged.
pub struct PolicyGate {
    client: Client,
    cache: RwLock<HashMap<String, PolicyCell>>,
}

impl PolicyGate {
    /// Creates a gate that fetches robots.txt with `client`
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Checks whether `user_agent` may fetch `url`
    ///
    /// # Returns
    ///
    /// * `true` - Allowed, or robots.txt unavailable for this host
    /// * `false` - Disallowed by robots.txt, or the URL has no host
    pub async fn can_fetch(&self, user_agent: &str, url: &Url) -> bool {
        match self.policy_for(url).await {
            Some(policy) => {
                let allowed = policy.is_allowed(url.as_str(), user_agent);
                if !allowed {
                    tracing::debug!(
                        "URL {} disallowed by robots.txt fetched at {}",
                        url,
                        policy.fetched_at.to_rfc3339()
                    );
                }
                allowed
            }
            None => false,
        }
    }

    /// Returns the Crawl-delay for `user_agent` on the host of `url`
    pub async fn crawl_delay(&self, user_agent: &str, url: &Url) -> Option<f64> {
        self.policy_for(url)
            .await
            .and_then(|policy| policy.crawl_delay(user_agent))
    }

    /// Returns the cached policy for the host of `url`, fetching it on first use
    pub async fn policy_for(&self, url: &Url) -> Option<Arc<RobotsPolicy>> {
        let origin = origin_of(url)?;
        let host = extract_host(url)?;
        let cell = self.cell_for(&origin).await;

        let policy = cell
            .get_or_init(|| fetch_policy(&self.client, origin.clone(), host))
            .await;
        Some(Arc::clone(policy))
    }

    /// Number of hosts with a resolved policy
    pub async fn cached_hosts(&self) -> usize {
        let cache = self.cache.read().await;
        cache.values().filter(|cell| cell.initialized()).count()
    }

    /// Gets or creates the cache slot for an origin
    async fn cell_for(&self, origin: &str) -> PolicyCell {
        {
            let cache = self.cache.read().await;
            if let Some(cell) = cache.get(origin) {
                return Arc::clone(cell);
            }
        }

        let mut cache = self.cache.write().await;
        Arc::clone(
            cache
                .entry(origin.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }
}

/// Fetches and parses robots.txt for one origin
///
/// Never fails: every failure mode yields the allow-all fallback.
async fn fetch_policy(client: &Client, origin: String, host: String) -> Arc<RobotsPolicy> {
    let robots_url = format!("{}/robots.txt", origin);
    tracing::debug!("Fetching robots.txt: {}", robots_url);

    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                host = %host,
                "Degraded robots policy: could not fetch {} ({}), allowing all",
                robots_url,
                e
            );
            return Arc::new(RobotsPolicy::fallback(host));
        }
    };

    let status = response.status();
    if status.is_server_error() {
        tracing::warn!(
            host = %host,
            "Degraded robots policy: {} returned HTTP {}, allowing all",
            robots_url,
            status.as_u16()
        );
        return Arc::new(RobotsPolicy::fallback(host));
    }

    if status != StatusCode::OK {
        // A missing robots.txt means the site publishes no restrictions
        tracing::debug!(
            "No robots.txt for {} (HTTP {}), allowing all",
            host,
            status.as_u16()
        );
        return Arc::new(RobotsPolicy::fallback(host));
    }

    match response.text().await {
        Ok(body) => {
            tracing::debug!("Loaded robots.txt for {} ({} bytes)", host, body.len());
            Arc::new(RobotsPolicy::fetched(host, &body))
        }
        Err(e) => {
            tracing::warn!(
                host = %host,
                "Degraded robots policy: unreadable body from {} ({}), allowing all",
                robots_url,
                e
            );
            Arc::new(RobotsPolicy::fallback(host))
        }
    }
}
