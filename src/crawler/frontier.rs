//! Visitation queue with deduplication and depth bound
//!
//! The frontier is owned by the scheduler's dispatch loop and is never shared
//! between tasks; all mutation goes through `&mut self`.

use std::collections::{HashSet, VecDeque};

/// A unit of work: a canonical URL and the depth it was discovered at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: String,
    pub depth: u32,
}

/// FIFO queue of pending [`CrawlTarget`]s plus the visited set
///
/// A URL occupies at most one queue slot, and once marked visited it is never
/// enqueued again for the rest of the run.
#[derive(Debug)]
pub struct Frontier {
    pending: VecDeque<CrawlTarget>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    visit_order: Vec<String>,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier that rejects targets deeper than `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            pending: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            visit_order: Vec::new(),
            max_depth,
        }
    }

    /// Adds `url` at `depth` unless it is visited, already queued, or too deep
    ///
    /// # Returns
    ///
    /// * `true` - The target was appended
    /// * `false` - The call was a no-op
    pub fn enqueue(&mut self, url: impl Into<String>, depth: u32) -> bool {
        if depth > self.max_depth {
            return false;
        }

        let url = url.into();
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }

        self.queued.insert(url.clone());
        self.pending.push_back(CrawlTarget { url, depth });
        true
    }

    /// Pops the oldest pending target
    pub fn dequeue(&mut self) -> Option<CrawlTarget> {
        let target = self.pending.pop_front()?;
        self.queued.remove(&target.url);
        Some(target)
    }

    /// Pops the oldest pending target accepted by `ready`
    ///
    /// Targets ahead of it keep their positions. Used to skip over hosts that
    /// are still inside their politeness interval.
    pub fn dequeue_where<F>(&mut self, mut ready: F) -> Option<CrawlTarget>
    where
        F: FnMut(&CrawlTarget) -> bool,
    {
        let index = self.pending.iter().position(|target| ready(target))?;
        let target = self.pending.remove(index)?;
        self.queued.remove(&target.url);
        Some(target)
    }

    /// Records `url` as visited so it can never be enqueued again
    ///
    /// Returns false if it was already visited.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        if self.visited.insert(url.to_string()) {
            self.visit_order.push(url.to_string());
            true
        } else {
            false
        }
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending targets
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Pending targets in queue order
    pub fn pending(&self) -> impl Iterator<Item = &CrawlTarget> {
        self.pending.iter()
    }

    /// Visited URLs in the order they were marked
    pub fn visited_urls(&self) -> &[String] {
        &self.visit_order
    }

    /// Consumes the frontier, returning the visited URLs in visit order
    pub fn into_visited_urls(self) -> Vec<String> {
        self.visit_order
    }
}
