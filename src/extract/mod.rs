//! Page-content extraction
//!
//! The crawler hands every fetched HTML body to an [`Extractor`] and stores
//! the returned [`ExtractionPayload`] alongside the discovered links. The
//! crawl core treats the payload as opaque.
//!
//! # Components
//!
//! - `Extractor`: the collaborator interface
//! - `HtmlExtractor`: default implementation backed by scraper
//! - `NoopExtractor`: returns an empty payload, for URL-only runs

mod html;
mod payload;

pub use html::HtmlExtractor;
pub use payload::{
    BusinessInfo, DocumentLink, DocumentLinks, ExtractionPayload, FormField, Forms, Media,
    MicrodataItem, Navigation, PageContent, PageMetadata, StructuredData, TeamMember, Testimonial,
};

use url::Url;

/// Turns a raw HTML body into a structured record
///
/// Implementations must be pure: no I/O, no shared mutable state. They must
/// not fail; malformed input yields an empty or partial payload.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str, url: &Url) -> ExtractionPayload;
}

/// Extractor that records nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtractor;

impl Extractor for NoopExtractor {
    fn extract(&self, _html: &str, _url: &Url) -> ExtractionPayload {
        ExtractionPayload::default()
    }
}
