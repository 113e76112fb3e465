//! File exporters for run output
//!
//! - `write_url_list`: newline-delimited visited URLs
//! - `write_json_lines`: one serialized CrawlResult per line
//! - `write_csv`: one row per CrawlResult with the payload flattened into columns

use crate::crawler::CrawlResult;
use crate::TrawlError;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Separator between nested key segments in CSV headers
pub const KEY_SEPARATOR: &str = ".";

/// Separator between list items inside one CSV cell
pub const LIST_SEPARATOR: &str = "; ";

/// Column holding the placeholder of the first form's email field
pub const EMAIL_PLACEHOLDER_COLUMN: &str = "forms.email_placeholder";

/// Writes one URL per line
pub fn write_url_list(path: &Path, urls: &[String]) -> Result<(), TrawlError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for url in urls {
        writeln!(writer, "{}", url)?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} URLs to {}", urls.len(), path.display());
    Ok(())
}

/// Writes each result as a single JSON document per line
pub fn write_json_lines(path: &Path, results: &[CrawlResult]) -> Result<(), TrawlError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for result in results {
        serde_json::to_writer(&mut writer, result)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} results to {}", results.len(), path.display());
    Ok(())
}

/// Writes results as CSV
///
/// Columns are `url`, `depth`, `discovered_links`, then every flattened
/// payload key in first-seen order, then [`EMAIL_PLACEHOLDER_COLUMN`].
/// Rows lacking a column get an empty cell.
pub fn write_csv(path: &Path, results: &[CrawlResult]) -> Result<(), TrawlError> {
    let rows = results
        .iter()
        .map(flatten_result)
        .collect::<Result<Vec<_>, TrawlError>>()?;

    let mut headers: Vec<String> = Vec::new();
    let mut known: HashSet<String> = HashSet::new();
    for row in &rows {
        for (key, _) in row {
            if known.insert(key.clone()) {
                headers.push(key.clone());
            }
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    if !headers.is_empty() {
        writer.write_record(&headers)?;
    }
    for row in &rows {
        let record = headers.iter().map(|header| {
            row.iter()
                .find(|(key, _)| key == header)
                .map(|(_, value)| value.as_str())
                .unwrap_or("")
        });
        writer.write_record(record)?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} CSV rows to {}", rows.len(), path.display());
    Ok(())
}

/// Flattens one result into ordered `(column, cell)` pairs
pub fn flatten_result(result: &CrawlResult) -> Result<Vec<(String, String)>, TrawlError> {
    let mut row = vec![
        ("url".to_string(), result.url.clone()),
        ("depth".to_string(), result.depth.to_string()),
        (
            "discovered_links".to_string(),
            result.discovered_links.join(LIST_SEPARATOR),
        ),
    ];

    let payload = serde_json::to_value(&result.extraction_payload)?;
    flatten_value(&payload, "", &mut row);

    let placeholder = result.extraction_payload.forms.email_placeholder();
    row.push((
        EMAIL_PLACEHOLDER_COLUMN.to_string(),
        placeholder.map(repair_encoding).unwrap_or_default(),
    ));
    Ok(row)
}

/// Flattens a JSON value
///
/// Nested object keys are joined with [`KEY_SEPARATOR`]; arrays become a
/// single cell joined with [`LIST_SEPARATOR`]; strings pass through
/// [`repair_encoding`]. Empty objects produce no columns.
pub fn flatten_value(value: &Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}{}{}", prefix, KEY_SEPARATOR, key)
                };
                flatten_value(child, &name, out);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(cell_text)
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR);
            out.push((prefix.to_string(), joined));
        }
        other => out.push((prefix.to_string(), cell_text(other))),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => repair_encoding(text),
        other => other.to_string(),
    }
}

/// Undoes UTF-8 text that was mis-decoded as Latin-1
///
/// If every char fits in one byte and those bytes form valid UTF-8, the
/// re-decoded string is returned; otherwise the input is returned unchanged.
///
/// ```
/// use site_trawler::output::repair_encoding;
///
/// assert_eq!(repair_encoding("cafÃ©"), "café");
/// assert_eq!(repair_encoding("café"), "café");
/// ```
pub fn repair_encoding(text: &str) -> String {
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        if code > 0xFF {
            return text.to_string();
        }
        bytes.push(code as u8);
    }

    String::from_utf8(bytes).unwrap_or_else(|_| text.to_string())
}
