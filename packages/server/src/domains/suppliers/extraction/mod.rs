//! Extraction engine: one RawSearchResult in, at least one SupplierRecord out.
//!
//! The preferred path re-asks the model to call `record_suppliers` once with
//! every supplier it can find. If the reply carries no such call, the search
//! text is parsed heuristically instead. Whatever goes wrong inside, the
//! caller gets records back: a placeholder when nothing was found, an error
//! record when extraction itself failed.

pub mod heuristic;
pub mod structured;

use std::sync::Arc;

use anthropic_client::{
    truncate_chars, AnthropicError, Message, MessageRequest, ToolChoice, ToolDefinition,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domains::discovery::models::RawSearchResult;
use crate::domains::suppliers::models::SupplierRecord;
use crate::domains::suppliers::prompts;
use crate::kernel::BaseAI;

pub use structured::{ExtractionContext, SupplierBatch, RECORD_SUPPLIERS_TOOL};

#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Search text beyond this many characters is cut before it is sent
    pub max_input_chars: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet-20240620".to_string(),
            max_tokens: 4000,
            temperature: 0.1,
            max_input_chars: 80_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("malformed search envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("extraction model call failed: {0}")]
    Model(#[from] AnthropicError),

    #[error("malformed record_suppliers input: {0}")]
    ToolInput(String),
}

pub struct SupplierExtractor {
    ai: Arc<dyn BaseAI>,
    settings: ExtractionSettings,
}

impl SupplierExtractor {
    pub fn new(ai: Arc<dyn BaseAI>, settings: ExtractionSettings) -> Self {
        Self { ai, settings }
    }

    /// Extract supplier records and mark the result processed.
    ///
    /// Never fails and never returns an empty list.
    pub async fn extract(&self, result: &mut RawSearchResult) -> Vec<SupplierRecord> {
        let records = match self.try_extract(result).await {
            Ok(records) if !records.is_empty() => {
                info!(
                    search_result_id = %result.id,
                    count = records.len(),
                    "extracted suppliers"
                );
                records
            }
            Ok(_) => {
                warn!(search_result_id = %result.id, "no suppliers extracted, storing placeholder");
                vec![placeholder_record(result)]
            }
            Err(e) => {
                error!(search_result_id = %result.id, error = %e, "supplier extraction failed");
                vec![error_record(result, &e)]
            }
        };

        result.is_processed = true;
        records
    }

    async fn try_extract(
        &self,
        result: &RawSearchResult,
    ) -> Result<Vec<SupplierRecord>, ExtractionError> {
        let text = result.text_content()?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let ctx = ExtractionContext {
            component: result.query_component.clone(),
            country: result.query_country.clone(),
            search_result_id: Some(result.id),
        };

        let research = truncate_chars(&text, self.settings.max_input_chars);
        let response = self.ai.create_message(self.request(&ctx, research)).await?;

        match response.tool_input(RECORD_SUPPLIERS_TOOL) {
            Some(input) => {
                let items = structured::supplier_items(input).map_err(ExtractionError::ToolInput)?;
                debug!(count = items.len(), "record_suppliers call received");
                Ok(items
                    .iter()
                    .map(|item| structured::record_from_value(item, &ctx))
                    .collect())
            }
            None => {
                debug!(
                    search_result_id = %result.id,
                    "no record_suppliers call in reply, parsing search text"
                );
                Ok(heuristic::parse_text_response(&text, &ctx))
            }
        }
    }

    fn request(&self, ctx: &ExtractionContext, research: &str) -> MessageRequest {
        MessageRequest::new(&self.settings.model)
            .system(prompts::EXTRACTION_SYSTEM_PROMPT)
            .message(Message::user(prompts::extraction_prompt(
                &ctx.component,
                &ctx.country,
                research,
            )))
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature)
            .tool(ToolDefinition::for_input::<SupplierBatch>(
                RECORD_SUPPLIERS_TOOL,
                structured::RECORD_SUPPLIERS_DESCRIPTION,
            ))
            .tool_choice(ToolChoice::tool(RECORD_SUPPLIERS_TOOL))
    }
}

/// Stand-in when extraction ran but found nobody.
pub fn placeholder_record(result: &RawSearchResult) -> SupplierRecord {
    SupplierRecord::builder()
        .search_result_id(Some(result.id))
        .name(format!(
            "AI Search Results: {} in {}",
            result.query_component, result.query_country
        ))
        .component_type(result.query_component.clone())
        .country(result.query_country.clone())
        .summary(Some(format!(
            "These are raw search results that need manual processing. Search ID: {}",
            result.id
        )))
        .raw_ai_source(result.raw_ai_response.clone())
        .build()
}

/// Stand-in when extraction itself failed.
pub fn error_record(result: &RawSearchResult, error: &ExtractionError) -> SupplierRecord {
    SupplierRecord::builder()
        .search_result_id(Some(result.id))
        .name(format!(
            "Error Processing: {} in {}",
            result.query_component, result.query_country
        ))
        .component_type(result.query_component.clone())
        .country(result.query_country.clone())
        .summary(Some(format!(
            "Error occurred while processing search results: {}",
            error
        )))
        .raw_ai_source(result.raw_ai_response.clone())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::discovery::models::TextFragment;
    use crate::kernel::test_dependencies::{supplier_tool_response, MockAI};
    use anthropic_client::{ContentBlock, ErrorClass, MessageResponse};
    use serde_json::json;

    fn search_result(text: &str) -> RawSearchResult {
        RawSearchResult::new(
            "bearings",
            "Germany",
            &[TextFragment { text: text.to_string() }],
        )
        .unwrap()
    }

    fn extractor(ai: Arc<MockAI>) -> SupplierExtractor {
        SupplierExtractor::new(ai, ExtractionSettings::default())
    }

    #[tokio::test]
    async fn tool_call_with_n_suppliers_yields_n_records() {
        let ai = Arc::new(MockAI::new().with_response(supplier_tool_response(vec![
            json!({"name": "Schaeffler", "country": "France"}),
            json!({"name": "SKF"}),
            json!({"name": "NSK", "component_type": "valves"}),
        ])));
        let mut result = search_result("Research about bearings suppliers.");

        let records = extractor(ai.clone()).extract(&mut result).await;

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.component_type == "bearings" && r.country == "Germany"));
        assert!(records.iter().all(|r| r.search_result_id == Some(result.id)));
        assert!(result.is_processed);
    }

    #[tokio::test]
    async fn request_forces_the_batched_tool_and_truncates_input() {
        let ai = Arc::new(MockAI::new().with_response(supplier_tool_response(vec![json!({"name": "A"})])));
        let settings = ExtractionSettings {
            max_input_chars: 10,
            ..Default::default()
        };
        let mut result = search_result("0123456789ABCDEFGHIJ");

        SupplierExtractor::new(ai.clone(), settings).extract(&mut result).await;

        let calls = ai.calls();
        assert_eq!(calls.len(), 1);
        let request = serde_json::to_value(&calls[0]).unwrap();
        assert_eq!(request["tool_choice"], json!({"type": "tool", "name": RECORD_SUPPLIERS_TOOL}));
        assert_eq!(request["tools"][0]["name"], RECORD_SUPPLIERS_TOOL);
        let prompt = request["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.ends_with("0123456789"));
    }

    #[tokio::test]
    async fn empty_tool_call_yields_single_placeholder() {
        let ai = Arc::new(MockAI::new().with_response(supplier_tool_response(vec![])));
        let mut result = search_result("Nothing useful.");

        let records = extractor(ai).extract(&mut result).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "AI Search Results: bearings in Germany");
        assert!(records[0]
            .summary
            .as_deref()
            .unwrap()
            .ends_with(&result.id.to_string()));
        assert_eq!(records[0].raw_ai_source, result.raw_ai_response);
        assert!(result.is_processed);
    }

    #[tokio::test]
    async fn model_failure_yields_error_record_with_raw_response() {
        let ai = Arc::new(MockAI::new().with_error(ErrorClass::Server, "overloaded"));
        let mut result = search_result("Some research.");

        let records = extractor(ai).extract(&mut result).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Error Processing: bearings in Germany");
        assert_eq!(records[0].raw_ai_source, result.raw_ai_response);
        assert!(records[0]
            .summary
            .as_deref()
            .unwrap()
            .starts_with("Error occurred while processing search results:"));
        assert!(result.is_processed);
    }

    #[tokio::test]
    async fn malformed_envelope_yields_error_record_without_calling_model() {
        let ai = Arc::new(MockAI::new());
        let mut result = search_result("irrelevant");
        result.raw_ai_response = "{not json".to_string();

        let records = extractor(ai.clone()).extract(&mut result).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_ai_source, "{not json");
        assert!(ai.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_tool_input_yields_error_record() {
        let ai = Arc::new(MockAI::new().with_response(MessageResponse::from_blocks(vec![
            ContentBlock::tool_invocation("t1", RECORD_SUPPLIERS_TOOL, json!({"suppliers": "many"})),
        ])));
        let mut result = search_result("Research.");

        let records = extractor(ai).extract(&mut result).await;

        assert_eq!(records.len(), 1);
        assert!(records[0].name.starts_with("Error Processing"));
    }

    #[tokio::test]
    async fn reply_without_tool_call_falls_back_to_text_sections() {
        let ai = Arc::new(MockAI::new().with_response(MessageResponse::from_blocks(vec![
            ContentBlock::text("I could not use the tool."),
        ])));
        let mut result = search_result(
            "1. Acme Manufacturer\nWebsite: https://acme.de\n2. Beta Supplier\nLocation: Hamburg",
        );

        let records = extractor(ai).extract(&mut result).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].website.as_deref(), Some("acme.de"));
        assert_eq!(records[1].location.as_deref(), Some("Hamburg"));
        assert!(records.iter().all(|r| r.country == "Germany"));
    }

    #[tokio::test]
    async fn empty_search_text_skips_model_and_yields_placeholder() {
        let ai = Arc::new(MockAI::new());
        let mut result = RawSearchResult::new("bearings", "Germany", &[]).unwrap();

        let records = extractor(ai.clone()).extract(&mut result).await;

        assert_eq!(records.len(), 1);
        assert!(records[0].name.starts_with("AI Search Results"));
        assert!(ai.calls().is_empty());
    }
}
