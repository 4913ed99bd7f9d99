//! Error types for the Anthropic client.

use thiserror::Error;

/// Result type for Anthropic client operations.
pub type Result<T> = std::result::Result<T, AnthropicError>;

/// Coarse classification of a failed call, decided where the error is first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing or unusable local configuration (no API key)
    Configuration,
    /// 401 / 403
    Authentication,
    /// 429
    RateLimited,
    /// 5xx, including 529 "overloaded"
    Server,
    /// 408, or the HTTP client gave up waiting
    Timeout,
    /// Connection refused, DNS, TLS
    Network,
    /// 400 / 404 / 413 / 422
    InvalidRequest,
    Other,
}

impl ErrorClass {
    /// Classify an HTTP status code returned by the API.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            408 => Self::Timeout,
            429 => Self::RateLimited,
            400 | 404 | 413 | 422 => Self::InvalidRequest,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }

    /// Whether a later attempt of the same request may succeed.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::RateLimited | Self::Server)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Authentication => "authentication",
            Self::RateLimited => "rate_limited",
            Self::Server => "server",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::InvalidRequest => "invalid_request",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anthropic client errors.
#[derive(Debug, Error)]
pub enum AnthropicError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    /// API error (non-2xx response)
    #[error("API error ({status}, {class}): {message}")]
    Api {
        status: u16,
        class: ErrorClass,
        message: String,
    },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AnthropicError {
    /// Build an API error, classifying it from the status code.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            class: ErrorClass::from_status(status),
            message: message.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_) => ErrorClass::Configuration,
            Self::Network { timed_out: true, .. } => ErrorClass::Timeout,
            Self::Network { .. } => ErrorClass::Network,
            Self::Api { class, .. } => *class,
            Self::Parse(_) => ErrorClass::Other,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class().is_transient()
    }
}

impl From<reqwest::Error> for AnthropicError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network {
            timed_out: e.is_timeout(),
            message: e.to_string(),
        }
    }
}
