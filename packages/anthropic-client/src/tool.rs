//! Tool definitions offered to the model.
//!
//! Two kinds exist: custom tools, whose calls come back to the caller as
//! `ContentBlock::ToolInvocation`, and server tools such as web search, which
//! the API executes itself before the response is returned.

use serde::Serialize;

use crate::schema::ToolInput;

/// Custom tool definition in the Messages API format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// The name of the tool.
    pub name: String,

    /// A description of what the tool does.
    pub description: String,

    /// JSON schema for the tool's input.
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Definition whose input schema is generated from `T`.
    pub fn for_input<T: ToolInput>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: T::input_schema(),
        }
    }
}

/// Server-side web search tool.
#[derive(Debug, Clone, Serialize)]
pub struct WebSearchTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
}

impl WebSearchTool {
    pub const TYPE: &'static str = "web_search_20250305";

    pub fn new() -> Self {
        Self {
            kind: Self::TYPE.to_string(),
            name: "web_search".to_string(),
            max_uses: None,
        }
    }

    /// Cap the number of searches the model may run for one request.
    pub fn max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Any tool that can go into `MessageRequest::tools`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolSpec {
    Custom(ToolDefinition),
    WebSearch(WebSearchTool),
}

impl From<ToolDefinition> for ToolSpec {
    fn from(tool: ToolDefinition) -> Self {
        Self::Custom(tool)
    }
}

impl From<WebSearchTool> for ToolSpec {
    fn from(tool: WebSearchTool) -> Self {
        Self::WebSearch(tool)
    }
}

/// How the model is allowed to pick tools.
#[derive(Debug, Clone, Serialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ToolChoice {
    /// Model decides whether to call a tool.
    pub fn auto() -> Self {
        Self {
            kind: "auto".to_string(),
            name: None,
        }
    }

    /// Model must call some tool.
    pub fn any() -> Self {
        Self {
            kind: "any".to_string(),
            name: None,
        }
    }

    /// Model must call the named tool.
    pub fn tool(name: impl Into<String>) -> Self {
        Self {
            kind: "tool".to_string(),
            name: Some(name.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct LookupArgs {
        query: String,
    }

    #[test]
    fn test_custom_tool_serializes_with_input_schema() {
        let spec: ToolSpec = ToolDefinition::for_input::<LookupArgs>("lookup", "Look something up").into();
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["name"], "lookup");
        assert_eq!(json["input_schema"]["type"], "object");
        assert!(json.get("type").is_none());
    }

    #[test]
    fn test_web_search_tool_serialization() {
        let json = serde_json::to_value(ToolSpec::from(WebSearchTool::new().max_uses(5))).unwrap();

        assert_eq!(json["type"], "web_search_20250305");
        assert_eq!(json["name"], "web_search");
        assert_eq!(json["max_uses"], 5);
    }

    #[test]
    fn test_named_tool_choice() {
        let json = serde_json::to_value(ToolChoice::tool("record_suppliers")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "tool", "name": "record_suppliers"}));

        let json = serde_json::to_value(ToolChoice::any()).unwrap();
        assert_eq!(json, serde_json::json!({"type": "any"}));
    }
}
