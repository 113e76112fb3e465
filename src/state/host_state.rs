use std::time::{Duration, Instant};

/// Tracks the politeness state of one host during a run
///
/// A host may have at most one fetch in flight. The next fetch may start
/// once the effective delay has elapsed since the previous one finished.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of fetches dispatched to this host in the current run
    pub request_count: u32,

    /// Whether a fetch to this host is currently in flight
    pub in_flight: bool,

    /// When the last fetch to this host finished
    pub last_request_time: Option<Instant>,

    /// Crawl-delay announced by the host's robots.txt, if any
    pub crawl_delay: Option<Duration>,
}

impl HostState {
    /// Creates a new HostState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the larger of the configured delay and the robots.txt crawl-delay
    pub fn effective_delay(&self, base_delay: Duration) -> Duration {
        match self.crawl_delay {
            Some(robots_delay) => std::cmp::max(base_delay, robots_delay),
            None => base_delay,
        }
    }

    /// Checks if a fetch can be dispatched to this host at `now`
    pub fn can_request(&self, base_delay: Duration, now: Instant) -> bool {
        !self.in_flight && self.time_until_next_request(base_delay, now).is_none()
    }

    /// Calculates the time until the politeness delay has elapsed
    ///
    /// Returns None if the delay has already elapsed. An in-flight fetch is
    /// not reflected here; callers check `in_flight` separately.
    pub fn time_until_next_request(&self, base_delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let delay = self.effective_delay(base_delay);
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a fetch was dispatched to this host
    pub fn record_dispatch(&mut self) {
        self.request_count += 1;
        self.in_flight = true;
    }

    /// Records that the in-flight fetch finished at `now`
    pub fn record_completion(&mut self, now: Instant) {
        self.in_flight = false;
        self.last_request_time = Some(now);
    }
}
