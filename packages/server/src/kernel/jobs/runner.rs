//! Polling loop that drains the job queue on the process's tokio runtime.
//!
//! Jobs in a claimed batch run sequentially. The outcome of each is written
//! back to the queue; a failed job stays failed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::queue::{ClaimedJob, JobQueue};
use super::registry::SharedJobRegistry;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    /// Jobs claimed per poll
    pub batch_size: i64,
    /// Sleep between polls that found nothing
    pub poll_interval: Duration,
    pub worker_id: String,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            poll_interval: Duration::from_secs(1),
            worker_id: format!("runner-{}", Uuid::now_v7()),
        }
    }
}

impl JobRunnerConfig {
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Self::default()
        }
    }
}

/// How a single job ended.
#[derive(Debug)]
enum JobOutcome {
    Succeeded,
    Failed(String),
}

pub struct JobRunner {
    job_queue: Arc<dyn JobQueue>,
    registry: SharedJobRegistry,
    deps: Arc<ServerDeps>,
    config: JobRunnerConfig,
    shutdown: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(
        job_queue: Arc<dyn JobQueue>,
        registry: SharedJobRegistry,
        deps: Arc<ServerDeps>,
    ) -> Self {
        Self::with_config(job_queue, registry, deps, JobRunnerConfig::default())
    }

    pub fn with_config(
        job_queue: Arc<dyn JobQueue>,
        registry: SharedJobRegistry,
        deps: Arc<ServerDeps>,
        config: JobRunnerConfig,
    ) -> Self {
        Self {
            job_queue,
            registry,
            deps,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between polls. Setting it lets the current batch finish.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Claim one batch and run it. Returns how many jobs were claimed.
    pub async fn process_batch(&self) -> Result<usize> {
        let batch = self
            .job_queue
            .claim(&self.config.worker_id, self.config.batch_size)
            .await?;
        if !batch.is_empty() {
            debug!(worker_id = %self.config.worker_id, count = batch.len(), "claimed jobs");
        }

        for job in &batch {
            let outcome = self.execute(job).await;
            self.record(job, outcome).await;
        }

        Ok(batch.len())
    }

    async fn execute(&self, job: &ClaimedJob) -> JobOutcome {
        debug!(job_id = %job.id, job_type = job.command_type(), attempt = job.job.attempts, "running job");
        match self.registry.execute(job, self.deps.clone()).await {
            Ok(()) => JobOutcome::Succeeded,
            Err(e) => JobOutcome::Failed(format!("{:#}", e)),
        }
    }

    async fn record(&self, job: &ClaimedJob, outcome: JobOutcome) {
        let written = match &outcome {
            JobOutcome::Succeeded => {
                info!(job_id = %job.id, job_type = job.command_type(), "job succeeded");
                self.job_queue.mark_succeeded(job.id).await
            }
            JobOutcome::Failed(reason) => {
                warn!(job_id = %job.id, job_type = job.command_type(), error = %reason, "job failed");
                self.job_queue.mark_failed(job.id, reason).await
            }
        };
        if let Err(e) = written {
            error!(job_id = %job.id, ?outcome, error = %e, "could not record job outcome");
        }
    }

    /// Poll until shutdown is requested. Claim errors are logged and retried
    /// after the poll interval.
    pub async fn run(self) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "job runner started"
        );

        while !self.shutdown.load(Ordering::SeqCst) {
            let idle = match self.process_batch().await {
                Ok(claimed) => claimed == 0,
                Err(e) => {
                    error!(error = %e, "claiming jobs failed");
                    true
                }
            };
            if idle {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        info!(worker_id = %self.config.worker_id, "job runner stopped");
        Ok(())
    }

    /// `run`, stopping on Ctrl-C.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = self.shutdown_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received, finishing current batch");
            }
            shutdown.store(true, Ordering::SeqCst);
        });

        self.run().await
    }
}
