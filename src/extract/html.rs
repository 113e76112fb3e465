//! Default HTML extractor
//!
//! Field rules:
//! - metadata: `<title>`, `meta[name=description|keywords|last-modified]`, `ol.breadcrumb li`
//! - content: `h1`..`h6` texts grouped by level, non-empty `<p>` texts
//! - navigation: `nav.menu a`, `footer a`
//! - media: `img[alt]`, `video[title|description]`, links ending in `.pdf`, `.doc` or `.docx`
//! - structured data: `script[type="application/ld+json"]` (unparsable blocks skipped),
//!   `[itemprop]` microdata
//! - business info: `.contact-info` phone/email/address, `time[datetime]`, `li.service-item`,
//!   `section#about-us`, `div.team-member`, `blockquote.testimonial`
//! - forms: `input`, `textarea` and `select` fields of each `<form>`

use super::payload::{
    BusinessInfo, DocumentLink, DocumentLinks, ExtractionPayload, FormField, Forms, Media,
    MicrodataItem, Navigation, PageContent, PageMetadata, StructuredData, TeamMember, Testimonial,
};
use super::Extractor;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// [`Extractor`] backed by the scraper HTML5 parser
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, html: &str, url: &Url) -> ExtractionPayload {
        let document = Html::parse_document(html);

        ExtractionPayload {
            metadata: extract_metadata(&document),
            content: extract_content(&document),
            navigation: Navigation {
                main_menu: select_texts(&document, "nav.menu a"),
                footer_links: select_texts(&document, "footer a"),
            },
            media: Media {
                image_alt_texts: select_attrs(&document, "img[alt]", "alt"),
                video_descriptions: extract_video_descriptions(&document),
                document_links: extract_document_links(&document, url),
            },
            structured_data: StructuredData {
                json_ld: extract_json_ld(&document, url),
                microdata: extract_microdata(&document),
            },
            business_info: extract_business_info(&document),
            forms: extract_forms(&document),
        }
    }
}

fn extract_metadata(document: &Html) -> PageMetadata {
    let keywords = meta_content(document, "keywords")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    PageMetadata {
        title: select_texts(document, "title").into_iter().next(),
        description: meta_content(document, "description"),
        keywords,
        last_modified: meta_content(document, "last-modified"),
        breadcrumb: select_texts(document, "ol.breadcrumb li"),
    }
}

fn extract_content(document: &Html) -> PageContent {
    let mut headings = BTreeMap::new();
    for level in 1..=6 {
        let tag = format!("h{}", level);
        let texts = select_texts(document, &tag);
        if !texts.is_empty() {
            headings.insert(tag, texts);
        }
    }

    PageContent {
        headings,
        paragraphs: select_texts(document, "p"),
    }
}

/// Collects links to office documents, resolved against the page URL
fn extract_document_links(document: &Html, page_url: &Url) -> DocumentLinks {
    let mut links = DocumentLinks::default();
    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = page_url.join(href.trim()) else {
            continue;
        };

        let path = resolved.path().to_ascii_lowercase();
        let bucket = if path.ends_with(".pdf") {
            &mut links.pdf
        } else if path.ends_with(".docx") {
            &mut links.docx
        } else if path.ends_with(".doc") {
            &mut links.doc
        } else {
            continue;
        };

        let title = element
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .unwrap_or_else(|| element_text(element));

        bucket.push(DocumentLink {
            url: resolved.to_string(),
            title,
        });
    }

    links
}

fn extract_json_ld(document: &Html, page_url: &Url) -> Vec<serde_json::Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|script| {
            let raw: String = script.text().collect();
            match serde_json::from_str(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Skipping unparsable JSON-LD on {}: {}", page_url, e);
                    None
                }
            }
        })
        .collect()
}

fn extract_business_info(document: &Html) -> BusinessInfo {
    let email = select_attrs(document, r#".contact-info a[href^="mailto:"]"#, "href")
        .into_iter()
        .next()
        .map(|href| href.trim_start_matches("mailto:").to_string());

    BusinessInfo {
        phone: select_texts(document, ".contact-info .phone").into_iter().next(),
        email,
        address: select_texts(document, ".contact-info .address").into_iter().next(),
        opening_hours: select_attrs(document, "time[datetime]", "datetime")
            .into_iter()
            .next(),
        services_offered: select_texts(document, "li.service-item"),
        about_us: select_texts(document, "section#about-us").into_iter().next(),
        team: extract_team(document),
        testimonials: extract_testimonials(document),
    }
}

fn extract_video_descriptions(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("video") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|video| {
            let attrs = video.value();
            [attrs.attr("title"), attrs.attr("description")]
                .into_iter()
                .flatten()
                .map(str::trim)
                .find(|text| !text.is_empty())
                .map(String::from)
        })
        .collect()
}

fn extract_microdata(document: &Html) -> Vec<MicrodataItem> {
    let Ok(selector) = Selector::parse("[itemprop]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let itemprop = element.value().attr("itemprop")?.trim();
            if itemprop.is_empty() {
                return None;
            }
            Some(MicrodataItem {
                itemprop: itemprop.to_string(),
                content: element_text(element),
            })
        })
        .collect()
}

/// Team cards: name from the first `<h3>`, role from the first `<p>`
fn extract_team(document: &Html) -> Vec<TeamMember> {
    let (Ok(card), Ok(heading), Ok(paragraph)) = (
        Selector::parse("div.team-member"),
        Selector::parse("h3"),
        Selector::parse("p"),
    ) else {
        return Vec::new();
    };

    document
        .select(&card)
        .filter_map(|member| {
            Some(TeamMember {
                name: first_text(member, &heading)?,
                role: first_text(member, &paragraph),
            })
        })
        .collect()
}

fn extract_testimonials(document: &Html) -> Vec<Testimonial> {
    let (Ok(quote), Ok(cite)) = (
        Selector::parse("blockquote.testimonial"),
        Selector::parse("cite"),
    ) else {
        return Vec::new();
    };

    document
        .select(&quote)
        .map(|testimonial| Testimonial {
            text: element_text(testimonial),
            author: first_text(testimonial, &cite),
        })
        .filter(|testimonial| !testimonial.text.is_empty())
        .collect()
}

fn extract_forms(document: &Html) -> Forms {
    let (Ok(form), Ok(field)) = (
        Selector::parse("form"),
        Selector::parse("input, textarea, select"),
    ) else {
        return Forms::default();
    };

    let details = document
        .select(&form)
        .map(|form| {
            form.select(&field)
                .map(|input| {
                    let attr = |name: &str| input.value().attr(name).map(String::from);
                    FormField {
                        field_type: attr("type"),
                        name: attr("name"),
                        placeholder: attr("placeholder"),
                        value: attr("value"),
                    }
                })
                .collect()
        })
        .collect();

    Forms { details }
}

/// Text of the first descendant of `parent` matching `selector`, if non-empty
fn first_text(parent: ElementRef<'_>, selector: &Selector) -> Option<String> {
    parent
        .select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// Reads `<meta name="{name}" content="...">`
fn meta_content(document: &Html, name: &str) -> Option<String> {
    select_attrs(document, &format!(r#"meta[name="{}"]"#, name), "content")
        .into_iter()
        .next()
}

/// Non-empty whitespace-normalized texts of every match, in document order
fn select_texts(document: &Html, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Non-empty trimmed values of `attr` on every match
fn select_attrs(document: &Html, css: &str, attr: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
