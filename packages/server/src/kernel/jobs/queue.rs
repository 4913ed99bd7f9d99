//! The job queue seam and its Postgres implementation.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::job::{Job, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueResult {
    Created(Uuid),
    /// A live job with the same idempotency key already exists
    Duplicate(Uuid),
}

impl EnqueueResult {
    pub fn job_id(&self) -> Uuid {
        match self {
            EnqueueResult::Created(id) | EnqueueResult::Duplicate(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, EnqueueResult::Created(_))
    }
}

/// A job this worker now owns.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub id: Uuid,
    pub job: Job,
}

impl ClaimedJob {
    pub fn command_type(&self) -> &str {
        &self.job.job_type
    }
}

/// What a command needs to say about itself to be queued.
pub trait CommandMeta {
    /// Stored as `job_type` and used to find the handler.
    fn command_type(&self) -> &'static str;

    /// At most one pending or running job exists per key.
    fn idempotency_key(&self) -> Option<String> {
        None
    }
}

/// Transport for background commands.
///
/// The queue never retries: a failed job is recorded as failed and left there.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Store a pending job, or report the live job already holding its
    /// idempotency key.
    async fn push(&self, job: Job) -> Result<EnqueueResult>;

    /// Take up to `limit` pending jobs, oldest first, marking them running.
    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedJob>>;

    async fn mark_succeeded(&self, job_id: Uuid) -> Result<()>;

    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<()>;
}

impl dyn JobQueue {
    /// Serialize `command` and push it.
    pub async fn enqueue<C>(&self, command: &C) -> Result<EnqueueResult>
    where
        C: Serialize + CommandMeta + Sync,
    {
        let job = Job::for_command(
            command.command_type(),
            serde_json::to_value(command)?,
            command.idempotency_key(),
        );
        self.push(job).await
    }
}

#[derive(Clone)]
pub struct PostgresJobQueue {
    pool: PgPool,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PostgresJobQueue {
    async fn push(&self, job: Job) -> Result<EnqueueResult> {
        if let Some(key) = &job.idempotency_key {
            if let Some(live) = Job::find_live_by_idempotency_key(key, &self.pool).await? {
                debug!(job_id = %live.id, idempotency_key = %key, "live job already holds key");
                return Ok(EnqueueResult::Duplicate(live.id));
            }
        }

        let stored = job.insert(&self.pool).await?;
        debug!(job_id = %stored.id, job_type = %stored.job_type, "job stored");
        Ok(EnqueueResult::Created(stored.id))
    }

    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedJob>> {
        Ok(Job::claim(limit, worker_id, &self.pool)
            .await?
            .into_iter()
            .map(|job| ClaimedJob { id: job.id, job })
            .collect())
    }

    async fn mark_succeeded(&self, job_id: Uuid) -> Result<()> {
        Job::finish(job_id, JobStatus::Succeeded, None, &self.pool).await
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<()> {
        Job::finish(job_id, JobStatus::Failed, Some(error), &self.pool).await
    }
}
