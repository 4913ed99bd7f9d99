//! Input schema generation for custom tools.
//!
//! Uses the `schemars` crate to generate JSON schemas from Rust types.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use anthropic_client::ToolInput;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Supplier {
//!     name: String,
//!     website: Option<String>,
//! }
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct SupplierBatch {
//!     suppliers: Vec<Supplier>,
//! }
//!
//! let schema = SupplierBatch::input_schema();
//! ```

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Trait for types that can describe a custom tool's input.
///
/// Automatically implemented for any type that implements `JsonSchema + DeserializeOwned`.
pub trait ToolInput: JsonSchema + DeserializeOwned {
    /// Generate the `input_schema` for a tool taking this type.
    ///
    /// The API expects a self-contained object schema, so `$ref`s into
    /// `definitions` are inlined and the `definitions`/`$schema`/`title`
    /// keys are removed from the root.
    fn input_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        inline_refs(&mut value);

        if let serde_json::Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
            map.remove("title");
        }

        value
    }
}

impl<T: JsonSchema + DeserializeOwned> ToolInput for T {}

/// Inline all $ref references by replacing them with the actual schema from definitions.
fn inline_refs(value: &mut serde_json::Value) {
    let definitions = if let serde_json::Value::Object(map) = value {
        map.get("definitions").cloned()
    } else {
        None
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut serde_json::Value, definitions: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(ref_path)) = map.get("$ref").cloned() {
                // "#/definitions/Supplier"
                if let Some(type_name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(type_name) {
                        *value = def.clone();
                        inline_refs_recursive(value, definitions);
                        return;
                    }
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}
