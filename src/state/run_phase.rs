//! Run phase definitions for the crawl control loop
//!
//! A run moves strictly forward through its phases.

use std::fmt;

/// The phase a crawl run is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Sitemap resolution and initial frontier population
    Seeding,

    /// Dispatching frontier entries to workers
    Running,

    /// No more dispatches; waiting for in-flight workers to finish
    Draining,

    /// Run output has been assembled
    Done,
}

impl RunPhase {
    /// Returns true if new fetches may still be dispatched in this phase
    pub fn accepts_dispatch(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Checks whether `next` is a legal successor of this phase
    ///
    /// Seeding may skip straight to Draining when nothing could be seeded.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Running)
                | (Self::Seeding, Self::Draining)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Done)
        )
    }

    /// Transitions to `next`, rejecting illegal moves
    pub fn transition(&mut self, next: RunPhase) -> Result<(), crate::TrawlError> {
        if !self.can_transition_to(next) {
            return Err(crate::TrawlError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::debug!("Run phase {} -> {}", self, next);
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
