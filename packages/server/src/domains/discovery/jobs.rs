//! Background jobs for the discovery domain.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domains::discovery::activities::run_supplier_task;
use crate::kernel::jobs::{CommandMeta, JobRegistry};
use crate::kernel::ServerDeps;

/// Run the worker body for one supplier task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierSearchJob {
    pub task_id: Uuid,
    pub component: String,
    pub country: String,
}

impl SupplierSearchJob {
    pub const JOB_TYPE: &'static str = "supplier_search";
}

impl CommandMeta for SupplierSearchJob {
    fn command_type(&self) -> &'static str {
        Self::JOB_TYPE
    }

    /// One live job per task.
    fn idempotency_key(&self) -> Option<String> {
        Some(format!("{}:{}", Self::JOB_TYPE, self.task_id))
    }
}

/// Register discovery job handlers.
pub fn register_jobs(registry: &mut JobRegistry) {
    registry.register::<SupplierSearchJob, _, _>(
        SupplierSearchJob::JOB_TYPE,
        |job, deps: Arc<ServerDeps>| async move {
            let task = run_supplier_task(job.task_id, &deps).await?;
            info!(task_id = %task.id, status = %task.status, "supplier search job finished");
            Ok::<_, anyhow::Error>(())
        },
    );
}
