//! Run statistics
//!
//! This module accumulates per-run counters while the scheduler works and
//! renders them once the run is done.

use crate::FetchErrorKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Counters accumulated over one crawl run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStats {
    /// Fetch attempts dispatched (successful or not)
    pub pages_crawled: u32,

    /// Fetches that produced a CrawlResult
    pub pages_succeeded: u32,

    /// Failed fetches keyed by error kind label
    pub failures: BTreeMap<String, u32>,

    /// Links returned by successful fetches (after normalization and robots.txt)
    pub links_discovered: u64,

    /// Links that actually entered the frontier
    pub links_enqueued: u64,

    /// Seeds that came from the sitemap (0 when the base URL was used)
    pub sitemap_seeds: usize,

    /// Hosts whose robots.txt policy was resolved
    pub robots_hosts: usize,

    /// Wall-clock duration of the run, in seconds
    pub elapsed_seconds: f64,
}

impl CrawlStats {
    pub fn record_success(&mut self, links: usize, enqueued: usize) {
        self.pages_succeeded += 1;
        self.links_discovered += links as u64;
        self.links_enqueued += enqueued as u64;
    }

    pub fn record_failure(&mut self, kind: &FetchErrorKind) {
        *self.failures.entry(kind.label().to_string()).or_insert(0) += 1;
    }

    /// Total failed fetches across all kinds
    pub fn failed(&self) -> u32 {
        self.failures.values().sum()
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_seconds = elapsed.as_secs_f64();
    }

    /// Average throughput over the run
    pub fn pages_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.pages_crawled as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages crawled: {}", stats.pages_crawled);
    println!("  Seeds from sitemap: {}", stats.sitemap_seeds);
    println!("  Links discovered: {}", stats.links_discovered);
    println!("  Links enqueued: {}", stats.links_enqueued);
    println!("  Hosts with robots.txt policy: {}", stats.robots_hosts);
    println!(
        "  Elapsed: {:.1}s ({:.2} pages/sec)",
        stats.elapsed_seconds,
        stats.pages_per_second()
    );
    println!();

    if !stats.failures.is_empty() {
        println!("Error Summary:");
        // Sort kinds by count (descending)
        let mut error_counts: Vec<_> = stats.failures.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in error_counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    let success_rate = if stats.pages_crawled > 0 {
        (stats.pages_succeeded as f64 / stats.pages_crawled as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed, {} skipped)",
        success_rate,
        stats.pages_succeeded,
        stats.pages_crawled,
        stats.failed()
    );
}
