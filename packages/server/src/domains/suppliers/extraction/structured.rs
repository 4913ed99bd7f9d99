//! Tool-call mode: the `record_suppliers` tool and conversion of its input.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domains::suppliers::models::SupplierRecord;

pub const RECORD_SUPPLIERS_TOOL: &str = "record_suppliers";

pub const RECORD_SUPPLIERS_DESCRIPTION: &str = "Record every distinct supplier identified in the research data. \
Call this exactly once, passing all suppliers together in the `suppliers` array.";

/// Input schema of the `record_suppliers` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SupplierBatch {
    /// One entry per distinct supplier company
    pub suppliers: Vec<ExtractedSupplier>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractedSupplier {
    /// Company name
    pub name: String,
    /// Website domain and path without the http:// or https:// prefix
    pub website: Option<String>,
    /// Headquarters or main manufacturing location
    pub location: Option<String>,
    /// Products relevant to the requested component
    pub product: Option<String>,
    /// Standard lead time in days, number only
    pub lead_time_days: Option<u32>,
    /// Minimum order quantity in units, number only
    pub min_order_qty: Option<u32>,
    /// Certifications held, e.g. "ISO 9001"
    pub certifications: Option<Vec<String>>,
    /// Two to three paragraph assessment of strengths, weaknesses and procurement fit
    pub summary: Option<String>,
}

/// What extraction knows from the query rather than from the model.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub component: String,
    pub country: String,
    pub search_result_id: Option<Uuid>,
}

/// `suppliers` array from a `record_suppliers` invocation.
pub fn supplier_items(input: &Value) -> Result<&Vec<Value>, String> {
    match input.get("suppliers") {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(format!("`suppliers` is {}, expected an array", kind_of(other))),
        None => Err("missing `suppliers` field".to_string()),
    }
}

/// Convert one supplier object into a record.
///
/// Parsing is lenient: wrong-typed fields are dropped rather than rejected,
/// so every element yields exactly one record. Component and country always
/// come from `ctx`.
pub fn record_from_value(item: &Value, ctx: &ExtractionContext) -> SupplierRecord {
    let builder = SupplierRecord::builder()
        .search_result_id(ctx.search_result_id)
        .website(text_field(item, "website").map(|w| strip_scheme(&w)))
        .location(text_field(item, "location"))
        .product(text_field(item, "product"))
        .component_type(ctx.component.clone())
        .country(ctx.country.clone())
        .lead_time_days(count_field(item, "lead_time_days"))
        .min_order_qty(count_field(item, "min_order_qty"))
        .certifications(list_field(item, "certifications"))
        .summary(text_field(item, "summary"))
        .raw_ai_source(serde_json::to_string(item).unwrap_or_default());

    match text_field(item, "name") {
        Some(name) => builder.name(name).build(),
        None => builder.build(),
    }
}

fn text_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative integer that fits the column. Strings like "14 days" count.
fn count_field(item: &Value, key: &str) -> Option<i32> {
    let value = match item.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))?,
        Value::String(s) => {
            let digits: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()?
        }
        _ => return None,
    };
    i32::try_from(value).ok().filter(|v| *v >= 0)
}

fn list_field(item: &Value, key: &str) -> Vec<String> {
    match item.get(key) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn strip_scheme(website: &str) -> String {
    website
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .to_string()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
