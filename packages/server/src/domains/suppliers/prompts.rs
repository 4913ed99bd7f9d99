//! Prompts for supplier extraction and evaluation.

use super::models::SupplierRecord;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a procurement specialist who turns supplier research into structured supplier profiles.";

/// Instructions plus the (already truncated) research text.
pub fn extraction_prompt(component: &str, country: &str, research: &str) -> String {
    format!(
        r#"Below is research about suppliers of {component} in {country}.

Your task:
1. Read the research carefully.
2. Identify every distinct supplier company it mentions.
3. Record all of them with a single call to the record_suppliers tool.
4. Give each supplier a concise 2-3 paragraph summary of strengths, weaknesses and fit for procurement.

Rules:
- One entry per distinct company, no duplicates.
- Extract as much as the research supports and never invent facts.
- lead_time_days and min_order_qty are plain numbers.
- Websites exclude the http:// and https:// prefix.
- List specific certifications mentioned (ISO, CE and similar).

Here is the research data:

{research}"#
    )
}

pub const EVALUATION_SYSTEM_PROMPT: &str = "You are a senior procurement analyst advising a category manager at an appliance manufacturer. \
You write short, candid supplier assessments.";

pub fn evaluation_prompt(supplier: &SupplierRecord) -> String {
    let or_unknown = |value: &Option<String>| value.clone().unwrap_or_else(|| "unknown".to_string());
    let number_or_unknown = |value: Option<i32>| value.map_or_else(|| "unknown".to_string(), |v| v.to_string());
    let certifications = if supplier.certifications.is_empty() {
        "none listed".to_string()
    } else {
        supplier.certifications.join(", ")
    };

    format!(
        r#"Evaluate this supplier of {component} for a buyer sourcing from {country}.

Name: {name}
Website: {website}
Location: {location}
Products: {product}
Lead time (days): {lead_time}
Minimum order quantity: {moq}
Certifications: {certifications}

Write two or three short paragraphs covering strengths, weaknesses and risks, and overall fit for procurement. Say so plainly when the information above is too thin to judge."#,
        component = supplier.component_type,
        country = supplier.country,
        name = supplier.name,
        website = or_unknown(&supplier.website),
        location = or_unknown(&supplier.location),
        product = or_unknown(&supplier.product),
        lead_time = number_or_unknown(supplier.lead_time_days),
        moq = number_or_unknown(supplier.min_order_qty),
    )
}
