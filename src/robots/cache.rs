//! Per-host robots.txt cache entry
//!
//! Entries are created lazily on the first query for a host and live for
//! the rest of the run; they never expire within a run.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Utc};

/// Cached robots.txt ruleset for one host
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Host the rules were fetched for
    pub host: String,

    /// The parsed robots.txt rules
    pub rules: ParsedRobots,

    /// When the robots.txt was fetched (or the fetch was abandoned)
    pub fetched_at: DateTime<Utc>,

    /// True when no authoritative rules could be obtained and the host is
    /// treated as allow-all
    pub fallback_allow_all: bool,
}

impl RobotsPolicy {
    /// Creates a policy from a fetched robots.txt body
    pub fn fetched(host: impl Into<String>, content: &str) -> Self {
        Self {
            host: host.into(),
            rules: ParsedRobots::from_content(content),
            fetched_at: Utc::now(),
            fallback_allow_all: false,
        }
    }

    /// Creates the allow-all policy used when robots.txt is unavailable
    pub fn fallback(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            rules: ParsedRobots::allow_all(),
            fetched_at: Utc::now(),
            fallback_allow_all: true,
        }
    }

    /// Checks if a URL is allowed according to the cached rules
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.fallback_allow_all || self.rules.is_allowed(url, user_agent)
    }

    /// Gets the crawl delay from the cached rules, in seconds
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.rules.crawl_delay(user_agent)
    }
}
