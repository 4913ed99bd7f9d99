//! Background execution of domain commands.
//!
//! ```text
//! enqueue_supplier_task ─► deps.job_queue.enqueue(&SupplierSearchJob) ─► jobs row (pending)
//!
//! JobRunner ─► claim (FOR UPDATE SKIP LOCKED) ─► JobRegistry::execute ─► domain handler
//!           └► mark_succeeded / mark_failed
//! ```
//!
//! Commands and their handlers live in the domains; this module only moves
//! them around.

mod job;
mod queue;
mod registry;
mod runner;

pub use job::{Job, JobStatus};
pub use queue::{ClaimedJob, CommandMeta, EnqueueResult, JobQueue, PostgresJobQueue};
pub use registry::{JobRegistry, SharedJobRegistry};
pub use runner::{JobRunner, JobRunnerConfig};

/// Registry with every domain's job handlers.
pub fn build_job_registry() -> JobRegistry {
    let mut registry = JobRegistry::new();
    crate::domains::discovery::jobs::register_jobs(&mut registry);
    registry
}
