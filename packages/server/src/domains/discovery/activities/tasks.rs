//! Asynchronous supplier tasks
//!
//! The request side creates a queued task and enqueues a job for it; the
//! worker side drives the task through search, extraction and persistence.
//! Retries are owned here, not by the job queue: the whole task body is
//! re-run on transient model errors, a bounded number of times.

use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domains::discovery::activities::query::{process_search_result, validate_query};
use crate::domains::discovery::error::{DiscoveryError, DiscoveryResult};
use crate::domains::discovery::jobs::SupplierSearchJob;
use crate::domains::discovery::models::{SupplierTask, TaskStatus};
use crate::domains::suppliers::models::{SupplierFilter, SupplierRecord};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone)]
pub struct TaskSettings {
    /// Extra attempts after the first one, for transient errors only
    pub max_retries: u32,
    pub retry_backoff: Duration,
    /// Generate evaluations for records the extraction left without a summary
    pub evaluate_suppliers: bool,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff: Duration::from_secs(10),
            evaluate_suppliers: false,
        }
    }
}

/// Create a queued task and hand it to the job queue.
pub async fn enqueue_supplier_task(
    component: &str,
    country: &str,
    deps: &ServerDeps,
) -> DiscoveryResult<SupplierTask> {
    let (component, country) = validate_query(component, country)?;

    let task = deps
        .tasks
        .insert_task(&SupplierTask::new(&component, &country))
        .await?;

    let job = SupplierSearchJob {
        task_id: task.id,
        component,
        country,
    };
    if let Err(e) = deps.job_queue.enqueue(&job).await {
        error!(task_id = %task.id, error = %e, "failed to enqueue supplier task");
        let mut failed = task.clone();
        if failed.fail(format!("could not be queued: {}", e)).is_ok() {
            if let Err(update_err) = deps.tasks.update_task(&failed).await {
                warn!(task_id = %task.id, error = %update_err, "failed to record enqueue failure");
            }
        }
        return Err(DiscoveryError::Store(e));
    }

    info!(task_id = %task.id, component = %task.component, country = %task.country, "supplier task queued");
    Ok(task)
}

pub async fn get_task(id: Uuid, deps: &ServerDeps) -> DiscoveryResult<SupplierTask> {
    deps.tasks
        .find_task(id)
        .await?
        .ok_or(DiscoveryError::NotFound { kind: "task", id })
}

/// Records saved by a completed task, newest first.
pub async fn task_results(id: Uuid, deps: &ServerDeps) -> DiscoveryResult<Vec<SupplierRecord>> {
    let task = get_task(id, deps).await?;
    if task.status != TaskStatus::Completed {
        return Err(DiscoveryError::NotCompleted {
            id,
            status: task.status,
        });
    }

    let limit = i64::from(task.supplier_count.unwrap_or(0));
    if limit == 0 {
        return Ok(Vec::new());
    }

    let filter = SupplierFilter {
        component_type: Some(task.component.clone()),
        country: Some(task.country.clone()),
        search_result_id: task.search_result_id,
    };
    Ok(deps.suppliers.find_recent_suppliers(&filter, limit).await?)
}

/// Worker body for one task.
///
/// Returns the task in whatever terminal state it ended up in. An `Err`
/// means the task state itself could not be read or written.
///
/// Transitions are applied to a copy and adopted only once the store has
/// accepted them, so the in-memory task always matches the stored row and a
/// failed write can still be followed by a write of `Failed`.
pub async fn run_supplier_task(task_id: Uuid, deps: &ServerDeps) -> DiscoveryResult<SupplierTask> {
    let mut task = get_task(task_id, deps).await?;
    if task.status.is_terminal() {
        info!(task_id = %task_id, status = %task.status, "task already finished, skipping");
        return Ok(task);
    }

    let settings = &deps.task_settings;
    let max_attempts = settings.max_retries + 1;
    let mut attempt = 1;

    loop {
        let err = match run_attempt(&mut task, attempt, max_attempts, deps).await {
            Ok(()) => return Ok(task),
            Err(e) => e,
        };

        if err.is_retryable() && attempt < max_attempts {
            warn!(task_id = %task_id, attempt, error = %err, "transient error, retrying task");
            let mut retrying = task.clone();
            retrying.note_retry(attempt, max_attempts, &err)?;
            match deps.tasks.update_task(&retrying).await {
                Ok(stored) => task = stored,
                Err(e) => warn!(task_id = %task_id, error = %e, "failed to record retry"),
            }
            tokio::time::sleep(settings.retry_backoff).await;
            attempt += 1;
            continue;
        }

        let mut finished = task.clone();
        if err.is_retryable() {
            error!(task_id = %task_id, attempts = attempt, error = %err, "supplier task retries exhausted");
            finished.give_up(attempt, &err)?;
        } else {
            error!(task_id = %task_id, error = %err, "supplier task failed");
            finished.fail(&err)?;
        }
        return Ok(deps.tasks.update_task(&finished).await?);
    }
}

/// One pass over search, extraction and persistence, ending in `Completed`.
async fn run_attempt(
    task: &mut SupplierTask,
    attempt: u32,
    max_attempts: u32,
    deps: &ServerDeps,
) -> DiscoveryResult<()> {
    let mut next = task.clone();
    next.start()?;
    *task = deps.tasks.update_task(&next).await?;
    info!(task_id = %task.id, attempt, max_attempts, "supplier task processing");

    let result = deps.searcher.search(&task.component, &task.country).await?;
    let result = deps.search_results.insert_search_result(&result).await?;

    let mut next = task.clone();
    next.record_search(result.id)?;
    *task = deps.tasks.update_task(&next).await?;

    let processed =
        process_search_result(result, deps.task_settings.evaluate_suppliers, deps).await?;

    let mut next = task.clone();
    next.complete(processed.extracted, processed.saved.len())?;
    *task = deps.tasks.update_task(&next).await?;

    info!(
        task_id = %task.id,
        found = processed.extracted,
        saved = processed.saved.len(),
        "supplier task completed"
    );
    Ok(())
}
