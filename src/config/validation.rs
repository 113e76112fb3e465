use crate::config::types::{Config, CrawlerConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
pub const MAX_WORKERS: u32 = 64;

/// Upper bound on the per-host politeness delay (one hour)
pub const MAX_REQUEST_DELAY_SECONDS: f64 = 3600.0;

/// Upper bound on the per-request timeout (ten minutes)
pub const MAX_REQUEST_TIMEOUT_SECONDS: f64 = 600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
pub fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;

    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    let delay = config.request_delay_seconds;
    if !(0.0..=MAX_REQUEST_DELAY_SECONDS).contains(&delay) {
        return Err(ConfigError::Validation(format!(
            "request_delay_seconds must be between 0 and {}, got {}",
            MAX_REQUEST_DELAY_SECONDS, delay
        )));
    }

    let timeout = config.request_timeout_seconds;
    if !(timeout > 0.0 && timeout <= MAX_REQUEST_TIMEOUT_SECONDS) {
        return Err(ConfigError::Validation(format!(
            "request_timeout_seconds must be > 0 and at most {}, got {}",
            MAX_REQUEST_TIMEOUT_SECONDS, timeout
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    Ok(())
}

/// Validates the crawl's base URL: absolute, http(s), with a host
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    if base_url.is_empty() {
        return Err(ConfigError::Validation(
            "base_url cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            base_url
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.urls_path.is_empty() {
        return Err(ConfigError::Validation(
            "urls_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.results_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "results_path cannot be empty when set".to_string(),
        ));
    }

    if matches!(config.csv_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
