//! A row of the `jobs` table: one serialized command and its progress.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Job {
    #[builder(default = Uuid::now_v7())]
    pub id: Uuid,

    pub job_type: String,
    /// Serialized command
    pub args: serde_json::Value,

    #[builder(default)]
    pub status: JobStatus,
    /// At most one pending or running job per key
    #[builder(default)]
    pub idempotency_key: Option<String>,
    #[builder(default)]
    pub attempts: i32,
    #[builder(default)]
    pub worker_id: Option<String>,
    #[builder(default)]
    pub error_message: Option<String>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Build a pending job for a serialized command.
    pub fn for_command(
        job_type: &str,
        args: serde_json::Value,
        idempotency_key: Option<String>,
    ) -> Self {
        Self::builder()
            .job_type(job_type)
            .args(args)
            .idempotency_key(idempotency_key)
            .build()
    }

    pub fn is_live(&self) -> bool {
        matches!(self.status, JobStatus::Pending | JobStatus::Running)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO jobs (id, job_type, args, status, idempotency_key, attempts, worker_id,
                              error_message, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.job_type)
        .bind(&self.args)
        .bind(self.status)
        .bind(&self.idempotency_key)
        .bind(self.attempts)
        .bind(&self.worker_id)
        .bind(&self.error_message)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Pending or running job holding `key`, if any.
    pub async fn find_live_by_idempotency_key(key: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM jobs
            WHERE idempotency_key = $1
              AND status IN ('pending', 'running')
            LIMIT 1
            "#,
        )
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Claim up to `limit` pending jobs for `worker_id`, oldest first.
    ///
    /// `FOR UPDATE SKIP LOCKED` keeps concurrent workers from claiming the
    /// same row.
    pub async fn claim(limit: i64, worker_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Self>(
            r#"
            WITH next_jobs AS (
                SELECT id
                FROM jobs
                WHERE status = 'pending'
                ORDER BY created_at
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE jobs
            SET
                status = 'running',
                attempts = attempts + 1,
                worker_id = $2,
                updated_at = NOW()
            WHERE id IN (SELECT id FROM next_jobs)
            RETURNING *
            "#,
        )
        .bind(limit)
        .bind(worker_id)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    /// Move a running job to `Succeeded` or `Failed`.
    ///
    /// Jobs are never re-queued; retries belong to whatever the job runs.
    pub async fn finish(
        id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
        pool: &PgPool,
    ) -> Result<()> {
        anyhow::ensure!(
            matches!(status, JobStatus::Succeeded | JobStatus::Failed),
            "job {} cannot finish as {:?}",
            id,
            status
        );

        let updated = sqlx::query(
            "UPDATE jobs SET status = $2, error_message = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(error_message)
        .execute(pool)
        .await?;

        anyhow::ensure!(updated.rows_affected() == 1, "job {} not found", id);
        Ok(())
    }
}
