//! Site-Trawler: a polite single-site crawler
//!
//! This crate discovers the pages of a target site (sitemap first, link
//! discovery otherwise), respects robots.txt and per-host politeness delays,
//! and hands every fetched page to an extraction collaborator that produces a
//! structured record for downstream analysis.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Trawler operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunPhase,
        to: state::RunPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("URL host {host} is outside the base host {base}")]
    CrossHost { host: String, base: String },
}

/// The reason a single fetch did not produce a [`crawler::CrawlResult`]
///
/// Every kind is recoverable: the scheduler records it and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Server answered with a non-200 status
    HttpStatus { code: u16 },

    /// Connection refused, DNS failure, TLS failure, truncated body
    Network { message: String },

    /// Connect or read exceeded the configured timeout
    Timeout,

    /// Response was not HTML
    ContentMismatch { content_type: String },

    /// The run was cancelled while the fetch was in flight
    Cancelled,
}

impl FetchErrorKind {
    /// Short stable label used for accounting and log fields
    pub fn label(&self) -> &'static str {
        match self {
            Self::HttpStatus { .. } => "http_status",
            Self::Network { .. } => "network",
            Self::Timeout => "timeout",
            Self::ContentMismatch { .. } => "content_mismatch",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Per-URL fetch failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("fetch of {url} failed: {kind:?}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

/// Result type alias for Site-Trawler operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlResult, CrawlScheduler};
pub use output::RunOutput;
pub use state::RunPhase;
pub use crate::url::{extract_host, UrlNormalizer};
