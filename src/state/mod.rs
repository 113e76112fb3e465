//! State module for tracking crawl progress
//!
//! This module provides the run-scoped state used by the crawl scheduler.
//!
//! # Components
//!
//! - `RunPhase`: The control-loop phase (seeding, running, draining, done)
//! - `HostState`: Per-host politeness tracking (in-flight fetch, last request, crawl-delay)

mod host_state;
mod run_phase;

// Re-export main types
pub use host_state::HostState;
pub use run_phase::RunPhase;
