//! Output module for crawl results
//!
//! This module handles:
//! - The `RunOutput` returned by a finished crawl
//! - Recording and printing crawl statistics
//! - Exporting visited URLs and results in various formats

mod export;
pub mod stats;

pub use export::{
    flatten_result, flatten_value, repair_encoding, write_csv, write_json_lines, write_url_list,
    EMAIL_PLACEHOLDER_COLUMN, KEY_SEPARATOR, LIST_SEPARATOR,
};
pub use stats::{print_statistics, CrawlStats};

use crate::config::OutputConfig;
use crate::crawler::CrawlResult;
use crate::TrawlError;
use serde::Serialize;
use std::path::Path;

/// Everything a finished run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOutput {
    /// Every URL dispatched to a fetch, in dispatch order
    pub visited_urls: Vec<String>,

    /// Successful fetches, in completion order
    pub results: Vec<CrawlResult>,

    /// Run counters
    pub stats: CrawlStats,
}

impl RunOutput {
    /// Writes the URL list and any optional exports named in `config`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - All requested files were written
    /// * `Err(TrawlError)` - A file could not be created or serialized
    pub fn write_files(&self, config: &OutputConfig) -> Result<(), TrawlError> {
        write_url_list(Path::new(&config.urls_path), &self.visited_urls)?;

        if let Some(results_path) = &config.results_path {
            write_json_lines(Path::new(results_path), &self.results)?;
        }

        if let Some(csv_path) = &config.csv_path {
            write_csv(Path::new(csv_path), &self.results)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_files_honours_optional_paths() {
        let dir = tempdir().unwrap();
        let urls_path = dir.path().join("urls.txt");
        let csv_path = dir.path().join("out.csv");

        let output = RunOutput {
            visited_urls: vec!["http://x.test/".to_string()],
            ..RunOutput::default()
        };
        let config = OutputConfig {
            urls_path: urls_path.to_string_lossy().into_owned(),
            results_path: None,
            csv_path: Some(csv_path.to_string_lossy().into_owned()),
        };

        output.write_files(&config).unwrap();
        assert!(urls_path.exists());
        assert!(csv_path.exists());
        assert!(!dir.path().join("results.jsonl").exists());
    }
}
