use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured record extracted from one page
///
/// Every field is optional or possibly empty; a page with malformed or
/// minimal markup yields a mostly default payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionPayload {
    pub metadata: PageMetadata,
    pub content: PageContent,
    pub navigation: Navigation,
    pub media: Media,
    pub structured_data: StructuredData,
    pub business_info: BusinessInfo,
    pub forms: Forms,
}

impl ExtractionPayload {
    /// True when nothing at all was extracted
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub last_modified: Option<String>,
    pub breadcrumb: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Heading texts keyed by tag name (`h1`..`h6`); absent levels are omitted
    pub headings: BTreeMap<String, Vec<String>>,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Navigation {
    pub main_menu: Vec<String>,
    pub footer_links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub image_alt_texts: Vec<String>,
    /// `title` (or `description`) attribute of each `<video>`
    pub video_descriptions: Vec<String>,
    pub document_links: DocumentLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLinks {
    pub pdf: Vec<DocumentLink>,
    pub doc: Vec<DocumentLink>,
    pub docx: Vec<DocumentLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredData {
    /// Parsed `application/ld+json` blocks
    pub json_ld: Vec<serde_json::Value>,
    pub microdata: Vec<MicrodataItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrodataItem {
    pub itemprop: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<String>,
    pub services_offered: Vec<String>,
    pub about_us: Option<String>,
    pub team: Vec<TeamMember>,
    pub testimonials: Vec<Testimonial>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub text: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forms {
    /// One entry per `<form>`, listing its input, textarea and select fields
    pub details: Vec<Vec<FormField>>,
}

impl Forms {
    /// Placeholder of the last email-typed field in the first form
    pub fn email_placeholder(&self) -> Option<&str> {
        self.details
            .first()?
            .iter()
            .rev()
            .find(|field| field.field_type.as_deref() == Some("email"))
            .and_then(|field| field.placeholder.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub name: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
}
