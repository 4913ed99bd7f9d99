use anthropic_client::AnthropicError;
use thiserror::Error;
use uuid::Uuid;

use super::models::{TaskStatus, TransitionError};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("task {id} is {status}, results are available once it is completed")]
    NotCompleted { id: Uuid, status: TaskStatus },

    #[error("supplier search failed: {0}")]
    Search(#[from] AnthropicError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl DiscoveryError {
    /// Only transient model errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            DiscoveryError::Search(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
