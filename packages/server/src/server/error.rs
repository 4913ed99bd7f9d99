use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::domains::discovery::DiscoveryError;

/// JSON error body: `{"error": "...", "message": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error,
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_input", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DiscoveryError> for ApiError {
    fn from(err: DiscoveryError) -> Self {
        match &err {
            DiscoveryError::InvalidInput(_) => Self::bad_request(err.to_string()),
            DiscoveryError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "not_found", err.to_string())
            }
            DiscoveryError::NotCompleted { .. } => {
                Self::new(StatusCode::CONFLICT, "not_completed", err.to_string())
            }
            DiscoveryError::Search(_)
            | DiscoveryError::Transition(_)
            | DiscoveryError::Store(_) => {
                error!(error = %err, "supplier query failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    format!("Error processing supplier query: {}", err),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::discovery::TaskStatus;
    use anthropic_client::AnthropicError;
    use uuid::Uuid;

    #[test]
    fn discovery_errors_map_to_statuses() {
        let id = Uuid::now_v7();
        let cases = [
            (DiscoveryError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (DiscoveryError::NotFound { kind: "task", id }, StatusCode::NOT_FOUND),
            (
                DiscoveryError::NotCompleted { id, status: TaskStatus::Processing },
                StatusCode::CONFLICT,
            ),
            (
                DiscoveryError::Search(AnthropicError::api(529, "overloaded")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn internal_errors_carry_a_descriptive_message() {
        let err = ApiError::from(DiscoveryError::Store(anyhow::anyhow!("connection reset")));

        assert_eq!(err.body.error, "internal_error");
        assert!(err.body.message.starts_with("Error processing supplier query:"));
        assert!(err.body.message.contains("connection reset"));
    }
}
