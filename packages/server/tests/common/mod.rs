// Common test utilities

pub mod harness;

pub use harness::*;

use procurement_core::kernel::test_dependencies::supplier_tool_response;
use serde_json::{json, Value};

/// Search text long enough to pass the length check, naming three suppliers.
pub const BEARINGS_RESEARCH: &str = "\
Here are the leading bearing suppliers in Germany.

1. Schaeffler Group - Manufacturer
Website: https://www.schaeffler.com
Location: Herzogenaurach
Lead time: 6 weeks
ISO 9001 certified

2. SKF GmbH - Supplier
Website: skf.com
Location: Schweinfurt

3. NKE Bearings - Manufacturer
Website: nke.at
Location: Steyr
";

/// Three `record_suppliers` items matching `BEARINGS_RESEARCH`.
pub fn bearing_suppliers() -> Vec<Value> {
    vec![
        json!({
            "name": "Schaeffler Group",
            "website": "https://www.schaeffler.com",
            "location": "Herzogenaurach",
            "lead_time_days": 42,
            "certifications": ["ISO 9001", "ISO 14001"]
        }),
        json!({ "name": "SKF GmbH", "website": "skf.com", "location": "Schweinfurt" }),
        json!({ "name": "NKE Bearings", "website": "http://nke.at", "min_order_qty": "500 units" }),
    ]
}

pub fn bearing_extraction() -> anthropic_client::MessageResponse {
    supplier_tool_response(bearing_suppliers())
}
