//! Pure Anthropic Messages API client
//!
//! A minimal client for the Anthropic API with no domain-specific logic.
//! Supports message creation with custom tools, the server-side web search
//! tool and extended thinking.
//!
//! # Example
//!
//! ```rust,ignore
//! use anthropic_client::{AnthropicClient, Message, MessageRequest, WebSearchTool};
//!
//! let client = AnthropicClient::from_env()?;
//!
//! let response = client
//!     .create_message(
//!         &MessageRequest::new("claude-3-7-sonnet-20250219")
//!             .message(Message::user("Who makes ball bearings in Germany?"))
//!             .tool(WebSearchTool::new())
//!             .thinking(4096)
//!             .max_tokens(8192),
//!     )
//!     .await?;
//!
//! println!("{}", response.text());
//! ```

pub mod error;
pub mod schema;
pub mod tool;
pub mod types;

pub use error::{AnthropicError, ErrorClass, Result};
pub use schema::ToolInput;
pub use tool::{ToolChoice, ToolDefinition, ToolSpec, WebSearchTool};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const API_VERSION: &str = "2023-06-01";

/// Pure Anthropic API client.
#[derive(Clone)]
pub struct AnthropicClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    betas: Vec<String>,
}

impl AnthropicClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            betas: Vec::new(),
        }
    }

    /// Create from environment variable `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnthropicError::Config("ANTHROPIC_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies, recorded fixtures, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set a whole-request timeout on the underlying HTTP client.
    ///
    /// Expiry surfaces as a `Network` error classified as `ErrorClass::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnthropicError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Opt in to a beta feature (sent as `anthropic-beta`).
    pub fn with_beta(mut self, beta: impl Into<String>) -> Self {
        self.betas.push(beta.into());
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a message.
    ///
    /// Non-2xx responses become `AnthropicError::Api` with the status already
    /// classified, so callers never need to look at the message text.
    pub async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse> {
        let start = std::time::Instant::now();

        let mut builder = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json");

        if !self.betas.is_empty() {
            builder = builder.header("anthropic-beta", self.betas.join(","));
        }

        let response = builder.json(request).send().await.map_err(|e| {
            warn!(error = %e, "Anthropic request failed");
            AnthropicError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<types::ErrorBody>(&error_text)
                .map(|body| body.error.message)
                .unwrap_or(error_text);
            warn!(status = %status, error = %message, "Anthropic API error");
            return Err(AnthropicError::api(status.as_u16(), message));
        }

        let raw: types::MessageResponseRaw = response
            .json()
            .await
            .map_err(|e| AnthropicError::Parse(e.to_string()))?;
        let message_response = MessageResponse::from(raw);

        debug!(
            model = %request.model,
            blocks = message_response.content.len(),
            stop_reason = message_response.stop_reason.as_deref().unwrap_or("none"),
            duration_ms = start.elapsed().as_millis(),
            "Anthropic message created"
        );

        Ok(message_response)
    }
}
