//! Keyword-driven text parsing for search output that carries no tool call.
//!
//! Tuned to the numbered-list / markdown-heading layout the search model
//! tends to produce. Every extractor returns `None` (or an empty list) when it
//! finds nothing; nothing in here fails.

use lazy_static::lazy_static;
use regex::Regex;

use crate::domains::suppliers::models::SupplierRecord;

use super::structured::{self, ExtractionContext};

/// Words that mark a line as the start of a new supplier entry.
const SECTION_MARKERS: [&str; 5] = ["Supplier", "Company", "Manufacturer", "Vendor", "Producer"];

/// Lines at or above this many characters are prose, not headers or values.
const SHORT_LINE: usize = 100;

const WEBSITE_KEYWORDS: [&str; 4] = ["Website:", "Website", "URL:", "URL"];
const LOCATION_KEYWORDS: [&str; 5] = ["Location:", "Location", "Headquarters:", "Address:", "Based in"];
const PRODUCT_KEYWORDS: [&str; 3] = ["Products:", "Product range:", "Offerings:"];
const LEAD_TIME_KEYWORDS: [&str; 4] = ["Lead time:", "Lead time", "Delivery time:", "Delivery within"];
const MIN_ORDER_KEYWORDS: [&str; 3] = ["Minimum order:", "MOQ:", "Minimum quantity:"];

lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"\d+").expect("valid digits regex");
    static ref CERTIFICATION: Regex =
        Regex::new(r"\b(ISO|CE|ASTM|ASME|EN|DIN|JIS|UL|FCC|RoHS)(?:\b|\d)").expect("valid certification regex");
    static ref FENCED_JSON: Regex =
        Regex::new(r"(?s)```json\s*(.*?)```").expect("valid fenced json regex");
}

/// Parse free text into supplier records.
///
/// A fenced ```json block takes precedence and is read like tool-call input;
/// otherwise the text is split into sections and each section mined field by
/// field. An empty input produces no records.
pub fn parse_text_response(text: &str, ctx: &ExtractionContext) -> Vec<SupplierRecord> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    if let Some(items) = fenced_json_items(text) {
        tracing::debug!(count = items.len(), "using fenced JSON block from search text");
        return items
            .iter()
            .map(|item| structured::record_from_value(item, ctx))
            .collect();
    }

    split_sections(text)
        .iter()
        .map(|section| record_from_section(section, ctx))
        .collect()
}

/// Supplier objects from the first ```json block, if it holds an array (or
/// an object with a `suppliers` array). Anything else is ignored.
pub fn fenced_json_items(text: &str) -> Option<Vec<serde_json::Value>> {
    let body = FENCED_JSON.captures(text)?.get(1)?.as_str();
    match serde_json::from_str::<serde_json::Value>(body.trim()) {
        Ok(serde_json::Value::Array(items)) => Some(items),
        Ok(serde_json::Value::Object(mut map)) => match map.remove("suppliers") {
            Some(serde_json::Value::Array(items)) => Some(items),
            _ => None,
        },
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "fenced JSON block did not parse, falling back to sections");
            None
        }
    }
}

/// A line opens a new section when it names a supplier-ish word and looks
/// like a numbered item or a markdown heading.
pub fn is_section_boundary(line: &str) -> bool {
    if !SECTION_MARKERS.iter().any(|marker| line.contains(marker)) {
        return false;
    }
    let trimmed = line.trim();
    let numbered = trimmed.chars().count() < SHORT_LINE
        && line.chars().take(3).any(|c| c.is_ascii_digit());

    numbered || trimmed.starts_with('#')
}

/// Split text into one section per presumed supplier.
///
/// Text before the first boundary stays as its own section. With no
/// boundaries at all the whole text is a single section.
pub fn split_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if is_section_boundary(line) && !current.trim().is_empty() {
            sections.push(current.trim().to_string());
            current = line.to_string();
        } else {
            current.push('\n');
            current.push_str(line);
        }
    }

    if !current.trim().is_empty() {
        sections.push(current.trim().to_string());
    }

    if sections.is_empty() {
        vec![text.to_string()]
    } else {
        sections
    }
}

/// Build one record from one section. The section itself is the audit source.
pub fn record_from_section(section: &str, ctx: &ExtractionContext) -> SupplierRecord {
    let product = extract_value(section, &PRODUCT_KEYWORDS)
        .unwrap_or_else(|| format!("{} supplier", ctx.component));

    let builder = SupplierRecord::builder()
        .search_result_id(ctx.search_result_id)
        .website(extract_website(section))
        .location(extract_value(section, &LOCATION_KEYWORDS))
        .product(Some(product))
        .component_type(ctx.component.clone())
        .country(ctx.country.clone())
        .lead_time_days(extract_number(section, &LEAD_TIME_KEYWORDS))
        .min_order_qty(extract_number(section, &MIN_ORDER_KEYWORDS))
        .certifications(extract_certifications(section))
        .raw_ai_source(section);

    match extract_name(section) {
        Some(name) => builder.name(name).build(),
        None => builder.build(),
    }
}

/// First short line that is not a heading or bullet, with list numbering and
/// markdown emphasis peeled off.
pub fn extract_name(section: &str) -> Option<String> {
    section
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.chars().count() < SHORT_LINE)
        .filter(|line| !line.starts_with(['#', '*', '-', '•']))
        .map(|line| {
            line.trim_start_matches(|c: char| c.is_ascii_digit() || ".-):* ".contains(c))
                .trim_end_matches(|c: char| "*: ".contains(c))
                .to_string()
        })
        .find(|name| !name.is_empty())
}

/// Value after the first keyword found, on that keyword's first line.
/// Keywords are tried in order so the more specific spellings win.
pub fn extract_value(section: &str, keywords: &[&str]) -> Option<String> {
    keywords.iter().find_map(|keyword| {
        section.lines().find_map(|line| {
            let (_, rest) = line.split_once(keyword)?;
            let value = rest.trim_matches(|c: char| ": -\t*".contains(c));
            (!value.is_empty()).then(|| value.to_string())
        })
    })
}

/// Website with any `http(s)://` prefix removed, cut at the first whitespace.
pub fn extract_website(section: &str) -> Option<String> {
    let raw = extract_value(section, &WEBSITE_KEYWORDS)?;
    let host_and_path = raw.replace("https://", "").replace("http://", "");
    host_and_path
        .split_whitespace()
        .next()
        .map(|s| s.to_string())
}

/// First run of digits on the first keyword line that has any.
pub fn extract_number(section: &str, keywords: &[&str]) -> Option<i32> {
    keywords.iter().find_map(|keyword| {
        section
            .lines()
            .filter(|line| line.contains(keyword))
            .find_map(|line| DIGITS.find(line))
            .and_then(|m| m.as_str().parse::<i32>().ok())
    })
}

/// Every short line naming a known certification scheme, kept as written,
/// first occurrence wins.
pub fn extract_certifications(section: &str) -> Vec<String> {
    let mut certifications: Vec<String> = Vec::new();

    for line in section.lines() {
        let cert = line.trim().trim_start_matches(['-', '*', '•', ' ']).trim();
        if cert.is_empty() || cert.chars().count() >= SHORT_LINE || !CERTIFICATION.is_match(cert) {
            continue;
        }
        if !certifications.iter().any(|existing| existing == cert) {
            certifications.push(cert.to_string());
        }
    }

    certifications
}
