//! SupplierTask model
//!
//! Durable handle for one asynchronous search + extract + persist run.
//! Status only moves forward; `Completed` and `Failed` are absorbing, both
//! here and in the UPDATE statement that persists a task.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Processing -> Processing is allowed so a retried attempt can re-enter.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Queued, Processing)
                | (Queued, Failed)
                | (Processing, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("task {id} is already {status}")]
    Terminal { id: Uuid, status: TaskStatus },

    #[error("task {id} cannot move from {from} to {to}")]
    Invalid {
        id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    },
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SupplierTask {
    pub id: Uuid,
    pub component: String,
    pub country: String,
    pub status: TaskStatus,
    pub message: String,
    pub search_result_id: Option<Uuid>,
    pub supplier_count: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SupplierTask {
    pub fn new(component: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            component: component.into(),
            country: country.into(),
            status: TaskStatus::Queued,
            message: "Task queued.".to_string(),
            search_result_id: None,
            supplier_count: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    fn transition(&mut self, next: TaskStatus, message: String) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                id: self.id,
                status: self.status,
            });
        }
        if !self.status.can_transition_to(next) {
            return Err(TransitionError::Invalid {
                id: self.id,
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.message = message;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Worker picked the task up (or re-entered it for a retry).
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Processing, "Starting supplier search.".to_string())
    }

    pub fn record_search(&mut self, search_result_id: Uuid) -> Result<(), TransitionError> {
        self.transition(
            TaskStatus::Processing,
            "Search complete, extracting supplier information.".to_string(),
        )?;
        self.search_result_id = Some(search_result_id);
        Ok(())
    }

    pub fn note_retry(
        &mut self,
        attempt: u32,
        max_attempts: u32,
        error: &impl std::fmt::Display,
    ) -> Result<(), TransitionError> {
        self.transition(
            TaskStatus::Processing,
            format!(
                "Temporary error, retrying (attempt {} of {}): {}",
                attempt, max_attempts, error
            ),
        )
    }

    /// `saved` is what made it to the store, which may be fewer than `found`.
    pub fn complete(&mut self, found: usize, saved: usize) -> Result<(), TransitionError> {
        self.transition(
            TaskStatus::Completed,
            format!("Completed: found {} suppliers, saved {}.", found, saved),
        )?;
        self.supplier_count = Some(i32::try_from(saved).unwrap_or(i32::MAX));
        Ok(())
    }

    pub fn fail(&mut self, reason: impl std::fmt::Display) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Failed, format!("Failed: {}", reason))
    }

    /// Retries exhausted on a transient error.
    pub fn give_up(
        &mut self,
        attempts: u32,
        error: &impl std::fmt::Display,
    ) -> Result<(), TransitionError> {
        self.transition(
            TaskStatus::Failed,
            format!("Failed after {} attempts: {}", attempts, error),
        )
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO supplier_tasks
                (id, component, country, status, message, search_result_id, supplier_count, started_at, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(self.id)
        .bind(&self.component)
        .bind(&self.country)
        .bind(self.status)
        .bind(&self.message)
        .bind(self.search_result_id)
        .bind(self.supplier_count)
        .bind(self.started_at)
        .bind(self.completed_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Persist the in-memory state. Rows already in a terminal status are left
    /// untouched and the call fails.
    pub async fn update(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE supplier_tasks
             SET status = $2,
                 message = $3,
                 search_result_id = $4,
                 supplier_count = $5,
                 completed_at = $6
             WHERE id = $1 AND status NOT IN ('completed', 'failed')
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.status)
        .bind(&self.message)
        .bind(self.search_result_id)
        .bind(self.supplier_count)
        .bind(self.completed_at)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow!("task {} not found or already in a terminal state", self.id))
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM supplier_tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}
