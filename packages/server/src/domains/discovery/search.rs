//! Search orchestrator - one web-search model call per query.

use std::sync::Arc;

use anthropic_client::{
    AnthropicError, ContentBlock, ErrorClass, Message, MessageRequest, WebSearchTool,
};
use chrono::Utc;
use tracing::{error, info, warn};

use super::models::{RawSearchResult, TextFragment};
use super::prompts;
use crate::kernel::BaseAI;

/// Below this many characters the search probably went wrong.
const SHORT_RESPONSE_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub model: String,
    pub max_tokens: u32,
    pub thinking_budget: u32,
    /// Thinking requires temperature 1
    pub temperature: f32,
    /// Cap on web searches per request; vendor default when unset
    pub max_web_searches: Option<u32>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-7-sonnet-20250219".to_string(),
            max_tokens: 20688,
            thinking_budget: 15331,
            temperature: 1.0,
            max_web_searches: None,
        }
    }
}

pub struct SupplierSearcher {
    ai: Arc<dyn BaseAI>,
    settings: SearchSettings,
}

impl SupplierSearcher {
    pub fn new(ai: Arc<dyn BaseAI>, settings: SearchSettings) -> Self {
        Self { ai, settings }
    }

    /// Run the web search and keep only the text the model wrote.
    ///
    /// Model errors are returned to the caller untouched; their class only
    /// picks the log level here. Nothing is persisted.
    pub async fn search(
        &self,
        component: &str,
        country: &str,
    ) -> Result<RawSearchResult, AnthropicError> {
        info!(component, country, model = %self.settings.model, "starting supplier web search");

        let response = self
            .ai
            .create_message(self.request(component, country))
            .await
            .map_err(|e| {
                log_search_error(&e);
                e
            })?;

        let fragments: Vec<TextFragment> = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(TextFragment { text }),
                ContentBlock::Reasoning { .. }
                | ContentBlock::ToolInvocation { .. }
                | ContentBlock::ToolResult { .. } => None,
            })
            .collect();

        let text_chars: usize = fragments.iter().map(|f| f.text.chars().count()).sum();
        if text_chars < SHORT_RESPONSE_CHARS {
            warn!(component, country, text_chars, "search returned very little text");
        }
        info!(
            component,
            country,
            fragments = fragments.len(),
            text_chars,
            "supplier web search completed"
        );

        RawSearchResult::new(component, country, &fragments)
            .map_err(|e| AnthropicError::Parse(format!("failed to serialize search text: {}", e)))
    }

    fn request(&self, component: &str, country: &str) -> MessageRequest {
        let mut web_search = WebSearchTool::new();
        if let Some(max_uses) = self.settings.max_web_searches {
            web_search = web_search.max_uses(max_uses);
        }

        MessageRequest::new(&self.settings.model)
            .message(Message::user(prompts::research_brief(
                component,
                country,
                Utc::now().date_naive(),
            )))
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature)
            .thinking(self.settings.thinking_budget)
            .tool(web_search)
    }
}

fn log_search_error(e: &AnthropicError) {
    match e.class() {
        ErrorClass::Authentication | ErrorClass::Configuration => {
            error!(error = %e, class = %e.class(), "search rejected, check ANTHROPIC_API_KEY")
        }
        ErrorClass::RateLimited => warn!(error = %e, "search rate limited"),
        ErrorClass::Server => error!(error = %e, "search failed on the provider side"),
        _ => error!(error = %e, class = %e.class(), "search failed"),
    }
}
