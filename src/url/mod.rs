//! URL handling module for Site-Trawler
//!
//! This module provides URL normalization, relative-reference resolution,
//! host extraction, and the optional same-host restriction.

mod domain;
mod normalize;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use domain::{extract_host, origin_of};
pub use normalize::{canonicalize, normalize_url};

/// Turns candidate hrefs into absolute, canonical URLs
///
/// Resolution uses standard URI reference resolution via [`Url::join`].
/// The output is suitable as a dedup key: scheme-qualified, lowercase host,
/// no fragment.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    /// Host of the crawl's base URL
    base_host: String,

    /// Reject URLs whose host differs from `base_host`
    restrict_to_base_domain: bool,
}

impl UrlNormalizer {
    /// Creates a normalizer for a crawl rooted at `site`
    ///
    /// # Returns
    ///
    /// * `Ok(UrlNormalizer)` - The site URL has a host
    /// * `Err(UrlError::MissingHost)` - The site URL has no host
    pub fn new(site: &Url, restrict_to_base_domain: bool) -> Result<Self, UrlError> {
        let base_host = extract_host(site).ok_or(UrlError::MissingHost)?;
        Ok(Self {
            base_host,
            restrict_to_base_domain,
        })
    }

    /// Returns whether the same-host restriction is active
    pub fn restricts_to_base_domain(&self) -> bool {
        self.restrict_to_base_domain
    }

    /// Resolves `candidate_href` against `base_url` and canonicalizes it
    ///
    /// Returns None when the candidate cannot be resolved, has no host or
    /// a non-http(s) scheme after resolution, or is cross-host while the
    /// restriction is on.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_trawler::UrlNormalizer;
    /// use url::Url;
    ///
    /// let base = Url::parse("http://example.test/docs/").unwrap();
    /// let normalizer = UrlNormalizer::new(&base, false).unwrap();
    ///
    /// let url = normalizer.normalize("../a#frag", &base).unwrap();
    /// assert_eq!(url.as_str(), "http://example.test/a");
    /// assert!(normalizer.normalize("mailto:x@example.test", &base).is_none());
    /// ```
    pub fn normalize(&self, candidate_href: &str, base_url: &Url) -> Option<Url> {
        match self.try_normalize(candidate_href, base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::trace!("Rejected link {:?}: {}", candidate_href, e);
                None
            }
        }
    }

    /// Same as [`normalize`](Self::normalize) but reports why a candidate was rejected
    pub fn try_normalize(&self, candidate_href: &str, base_url: &Url) -> Result<Url, UrlError> {
        let href = candidate_href.trim();
        if href.is_empty() {
            return Err(UrlError::Parse("empty href".to_string()));
        }

        let resolved = base_url
            .join(href)
            .map_err(|e| UrlError::Parse(e.to_string()))?;
        let url = canonicalize(resolved)?;

        if self.restrict_to_base_domain {
            let host = extract_host(&url).ok_or(UrlError::MissingHost)?;
            if host != self.base_host {
                return Err(UrlError::CrossHost {
                    host,
                    base: self.base_host.clone(),
                });
            }
        }

        Ok(url)
    }
}
