//! Sitemap resolution
//!
//! Fetches one sitemap document and flattens its `<url><loc>` entries into a
//! list. Sitemap-index files are not followed: their `<sitemap><loc>`
//! entries are logged and dropped.

use ::sitemap::reader::{SiteMapEntity, SiteMapReader};
use reqwest::{Client, StatusCode};
use std::io::Cursor;
use std::time::Duration;

/// Best-effort sitemap fetcher
#[derive(Debug, Clone)]
pub struct SitemapResolver {
    client: Client,
    timeout: Duration,
}

impl SitemapResolver {
    /// Creates a resolver whose single GET is bounded by `timeout`
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetches `sitemap_url` and returns the page URLs it lists
    ///
    /// Never fails. A non-200 response, a network error, a timeout, or an
    /// unparsable document all yield an empty list, which callers treat as
    /// "no sitemap".
    pub async fn resolve(&self, sitemap_url: &str) -> Vec<String> {
        let request = self.client.get(sitemap_url).timeout(self.timeout).send();

        let response = match request.await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Sitemap {} unavailable: {}", sitemap_url, e);
                return Vec::new();
            }
        };

        if response.status() != StatusCode::OK {
            tracing::debug!(
                "Sitemap {} returned HTTP {}",
                sitemap_url,
                response.status().as_u16()
            );
            return Vec::new();
        }

        match response.bytes().await {
            Ok(body) => parse_sitemap(sitemap_url, &body),
            Err(e) => {
                tracing::debug!("Failed to read sitemap {}: {}", sitemap_url, e);
                Vec::new()
            }
        }
    }
}

/// Extracts `<url><loc>` values from a sitemap document
///
/// Any XML error discards the whole document.
pub fn parse_sitemap(sitemap_url: &str, xml: &[u8]) -> Vec<String> {
    let mut urls = Vec::new();
    let mut nested = 0usize;

    for entity in SiteMapReader::new(Cursor::new(xml)) {
        match entity {
            SiteMapEntity::Url(entry) => match entry.loc.get_url() {
                Some(url) => urls.push(url.to_string()),
                None => tracing::debug!("Skipping sitemap entry without a valid <loc>"),
            },
            SiteMapEntity::SiteMap(entry) => {
                nested += 1;
                if let Some(url) = entry.loc.get_url() {
                    tracing::info!("Not following nested sitemap {}", url);
                }
            }
            SiteMapEntity::Err(e) => {
                tracing::warn!("Malformed sitemap {}: {:?}", sitemap_url, e);
                return Vec::new();
            }
        }
    }

    if nested > 0 {
        tracing::info!(
            "{} is a sitemap index; {} nested sitemap(s) ignored",
            sitemap_url,
            nested
        );
    }

    urls
}
