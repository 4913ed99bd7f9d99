//! Narrative supplier evaluations.
//!
//! Purely additive: a failed evaluation becomes a placeholder summary and
//! never stops the records from being saved.

use std::sync::Arc;

use anthropic_client::{Message, MessageRequest};
use tracing::{info, warn};

use super::models::SupplierRecord;
use super::prompts;
use crate::kernel::BaseAI;

pub const EVALUATION_UNAVAILABLE: &str = "Evaluation unavailable";

#[derive(Debug, Clone)]
pub struct EvaluationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet-20240620".to_string(),
            max_tokens: 1024,
            temperature: 0.3,
        }
    }
}

pub struct SupplierEvaluator {
    ai: Arc<dyn BaseAI>,
    settings: EvaluationSettings,
}

impl SupplierEvaluator {
    pub fn new(ai: Arc<dyn BaseAI>, settings: EvaluationSettings) -> Self {
        Self { ai, settings }
    }

    /// Assessment text, or a placeholder starting with `EVALUATION_UNAVAILABLE`.
    pub async fn evaluate(&self, supplier: &SupplierRecord) -> String {
        self.try_evaluate(supplier)
            .await
            .unwrap_or_else(|reason| unavailable(&reason))
    }

    /// Evaluate suppliers one after another, writing each summary in place.
    ///
    /// Returns how many evaluations succeeded. Failed ones still get the
    /// placeholder summary.
    pub async fn evaluate_batch<'a, I>(&self, suppliers: I) -> usize
    where
        I: IntoIterator<Item = &'a mut SupplierRecord>,
    {
        let mut attempted = 0;
        let mut succeeded = 0;

        for supplier in suppliers {
            attempted += 1;
            match self.try_evaluate(supplier).await {
                Ok(summary) => {
                    supplier.summary = Some(summary);
                    succeeded += 1;
                }
                Err(reason) => {
                    warn!(supplier = %supplier.name, error = %reason, "supplier evaluation failed");
                    supplier.summary = Some(unavailable(&reason));
                }
            }
        }

        info!(attempted, succeeded, "supplier evaluations finished");
        succeeded
    }

    async fn try_evaluate(&self, supplier: &SupplierRecord) -> Result<String, String> {
        let request = MessageRequest::new(&self.settings.model)
            .system(prompts::EVALUATION_SYSTEM_PROMPT)
            .message(Message::user(prompts::evaluation_prompt(supplier)))
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature);

        let response = self
            .ai
            .create_message(request)
            .await
            .map_err(|e| e.to_string())?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err("model returned no text".to_string());
        }
        Ok(text.trim().to_string())
    }
}

fn unavailable(reason: &str) -> String {
    format!("{}: {}", EVALUATION_UNAVAILABLE, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockAI;
    use anthropic_client::{ContentBlock, ErrorClass, MessageResponse};

    fn supplier(name: &str) -> SupplierRecord {
        SupplierRecord::builder()
            .name(name)
            .component_type("bearings")
            .country("Germany")
            .raw_ai_source("{}")
            .build()
    }

    fn text_reply(text: &str) -> MessageResponse {
        MessageResponse::from_blocks(vec![ContentBlock::text(text)])
    }

    #[tokio::test]
    async fn evaluate_returns_model_text() {
        let ai = Arc::new(MockAI::new().with_response(text_reply("  Solid supplier.  ")));
        let evaluator = SupplierEvaluator::new(ai.clone(), EvaluationSettings::default());

        assert_eq!(evaluator.evaluate(&supplier("Acme")).await, "Solid supplier.");

        let prompt = &ai.calls()[0].messages[0].content;
        assert!(prompt.contains("Name: Acme"));
        assert!(prompt.contains("bearings"));
    }

    #[tokio::test]
    async fn evaluate_never_raises() {
        let ai = Arc::new(MockAI::new().with_error(ErrorClass::Authentication, "invalid x-api-key"));
        let evaluator = SupplierEvaluator::new(ai, EvaluationSettings::default());

        let summary = evaluator.evaluate(&supplier("Acme")).await;

        assert!(summary.starts_with(EVALUATION_UNAVAILABLE));
        assert!(summary.contains("invalid x-api-key"));
    }

    #[tokio::test]
    async fn batch_tolerates_failures_and_counts_successes() {
        let ai = Arc::new(
            MockAI::new()
                .with_response(text_reply("Good fit."))
                .with_error(ErrorClass::RateLimited, "slow down")
                .with_response(text_reply("Risky.")),
        );
        let evaluator = SupplierEvaluator::new(ai.clone(), EvaluationSettings::default());
        let mut suppliers = vec![supplier("A"), supplier("B"), supplier("C")];

        let succeeded = evaluator.evaluate_batch(suppliers.iter_mut()).await;

        assert_eq!(succeeded, 2);
        assert_eq!(ai.calls().len(), 3);
        assert_eq!(suppliers[0].summary.as_deref(), Some("Good fit."));
        assert!(suppliers[1]
            .summary
            .as_deref()
            .unwrap()
            .starts_with(EVALUATION_UNAVAILABLE));
        assert_eq!(suppliers[2].summary.as_deref(), Some("Risky."));
    }
}
