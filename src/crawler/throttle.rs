//! Per-host politeness bookkeeping
//!
//! This module handles:
//! - At most one in-flight fetch per host
//! - Respecting the delay between consecutive fetches to a host
//! - Integrating robots.txt crawl delays

use crate::state::HostState;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks [`HostState`] for every host the run has touched
#[derive(Debug)]
pub struct HostThrottle {
    hosts: HashMap<String, HostState>,
    base_delay: Duration,
}

impl HostThrottle {
    /// Creates a throttle enforcing `base_delay` between fetches to one host
    pub fn new(base_delay: Duration) -> Self {
        Self {
            hosts: HashMap::new(),
            base_delay,
        }
    }

    /// Checks whether a fetch to `host` may start at `now`
    ///
    /// Hosts that have not been seen yet are always ready.
    pub fn is_ready(&self, host: &str, now: Instant) -> bool {
        self.hosts
            .get(host)
            .map_or(true, |state| state.can_request(self.base_delay, now))
    }

    /// Records the robots.txt crawl-delay for `host`
    pub fn set_crawl_delay(&mut self, host: &str, delay: Option<Duration>) {
        self.state_mut(host).crawl_delay = delay;
    }

    /// Whether a crawl-delay lookup has been stored for `host`
    pub fn knows(&self, host: &str) -> bool {
        self.hosts.contains_key(host)
    }

    /// Marks a fetch to `host` as in flight
    pub fn record_dispatch(&mut self, host: &str) {
        self.state_mut(host).record_dispatch();
    }

    /// Releases the in-flight slot for `host` and starts its delay interval
    pub fn record_completion(&mut self, host: &str, now: Instant) {
        self.state_mut(host).record_completion(now);
    }

    /// Calculates how long to wait before any of `hosts` becomes ready
    ///
    /// Hosts with a fetch in flight are skipped: their completion wakes the
    /// scheduler anyway.
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - Shortest remaining delay among idle hosts
    /// * `None` - Every listed host is in flight, or one is ready now
    pub fn min_wait<'a, I>(&self, hosts: I, now: Instant) -> Option<Duration>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut min_wait: Option<Duration> = None;

        for host in hosts {
            let Some(state) = self.hosts.get(host) else {
                return None;
            };
            if state.in_flight {
                continue;
            }
            match state.time_until_next_request(self.base_delay, now) {
                Some(wait) => {
                    min_wait = Some(min_wait.map_or(wait, |current| current.min(wait)));
                }
                None => return None,
            }
        }

        min_wait
    }

    /// Number of fetches dispatched to `host` so far
    pub fn request_count(&self, host: &str) -> u32 {
        self.hosts.get(host).map_or(0, |state| state.request_count)
    }

    pub fn get(&self, host: &str) -> Option<&HostState> {
        self.hosts.get(host)
    }

    fn state_mut(&mut self, host: &str) -> &mut HostState {
        self.hosts.entry(host.to_string()).or_insert_with(HostState::new)
    }
}
