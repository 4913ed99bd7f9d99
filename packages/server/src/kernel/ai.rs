// AI implementation using the Anthropic Messages API
//
// This is the infrastructure implementation of BaseAI.
// Business logic (what to prompt for) lives in domain layers.

use anthropic_client::{AnthropicClient, MessageRequest, MessageResponse};
use async_trait::async_trait;

use super::BaseAI;

#[async_trait]
impl BaseAI for AnthropicClient {
    async fn create_message(
        &self,
        request: MessageRequest,
    ) -> anthropic_client::Result<MessageResponse> {
        AnthropicClient::create_message(self, &request).await
    }
}
