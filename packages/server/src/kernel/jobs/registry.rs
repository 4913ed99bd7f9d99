//! Dispatch table from a job's `job_type` column to the domain code that runs it.
//!
//! The queue stores commands as JSON; handlers registered here turn that JSON
//! back into the typed command before calling into the domain.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::queue::{ClaimedJob, CommandMeta};
use crate::kernel::ServerDeps;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type JobHandler = Box<dyn Fn(serde_json::Value, Arc<ServerDeps>) -> HandlerFuture + Send + Sync>;

/// Job type → handler.
///
/// ```ignore
/// let mut registry = JobRegistry::new();
/// registry.register::<SupplierSearchJob, _, _>(SupplierSearchJob::JOB_TYPE, |job, deps| async move {
///     run_supplier_task(job.task_id, &deps).await?;
///     Ok(())
/// });
/// ```
#[derive(Default)]
pub struct JobRegistry {
    handlers: HashMap<&'static str, JobHandler>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route jobs of `job_type` to `handler`. A second registration for the
    /// same type replaces the first.
    pub fn register<J, F, Fut>(&mut self, job_type: &'static str, handler: F)
    where
        J: CommandMeta + DeserializeOwned + Send + 'static,
        F: Fn(J, Arc<ServerDeps>) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let dispatch: JobHandler = Box::new(move |args, deps| {
            let handler = handler.clone();
            Box::pin(async move {
                let command: J = serde_json::from_value(args)
                    .with_context(|| format!("malformed {} payload", job_type))?;
                handler(command, deps).await
            })
        });

        if self.handlers.insert(job_type, dispatch).is_some() {
            warn!(job_type, "job handler registered twice, keeping the latest");
        }
    }

    /// Run a claimed job. Unknown types and undecodable payloads are errors,
    /// same as a failing handler.
    pub async fn execute(&self, job: &ClaimedJob, deps: Arc<ServerDeps>) -> Result<()> {
        let Some(handler) = self.handlers.get(job.command_type()) else {
            bail!("no handler registered for job type {}", job.command_type());
        };
        handler(job.job.args.clone(), deps).await
    }

    pub fn is_registered(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }
}

pub type SharedJobRegistry = Arc<JobRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use crate::kernel::jobs::Job;
    use crate::kernel::test_dependencies::TestDependencies;

    #[derive(Debug, Serialize, Deserialize)]
    struct ValveLookup {
        component: String,
    }

    impl CommandMeta for ValveLookup {
        fn command_type(&self) -> &'static str {
            "valve_lookup"
        }
    }

    fn claimed(job_type: &str, args: serde_json::Value) -> ClaimedJob {
        let job = Job::for_command(job_type, args, None);
        ClaimedJob { id: job.id, job }
    }

    fn registry() -> JobRegistry {
        let mut registry = JobRegistry::new();
        registry.register::<ValveLookup, _, _>("valve_lookup", |job, _deps| async move {
            anyhow::ensure!(job.component == "valves", "unexpected component {}", job.component);
            Ok(())
        });
        registry
    }

    #[test]
    fn registered_types_are_listed_sorted() {
        let mut registry = registry();
        registry.register::<ValveLookup, _, _>("another_lookup", |_job, _deps| async move { Ok(()) });

        assert!(registry.is_registered("valve_lookup"));
        assert!(!registry.is_registered("supplier_search"));
        assert_eq!(registry.registered_types(), vec!["another_lookup", "valve_lookup"]);
    }

    #[tokio::test]
    async fn execute_decodes_the_payload_for_its_handler() {
        let deps = Arc::new(TestDependencies::new().server_deps());

        registry()
            .execute(&claimed("valve_lookup", json!({"component": "valves"})), deps.clone())
            .await
            .unwrap();

        let refused = registry()
            .execute(&claimed("valve_lookup", json!({"component": "pumps"})), deps)
            .await
            .unwrap_err();
        assert!(refused.to_string().contains("unexpected component pumps"));
    }

    #[tokio::test]
    async fn unknown_types_and_bad_payloads_are_errors() {
        let deps = Arc::new(TestDependencies::new().server_deps());

        let unknown = registry()
            .execute(&claimed("supplier_search", json!({})), deps.clone())
            .await
            .unwrap_err();
        assert!(unknown.to_string().contains("no handler registered"));

        let malformed = registry()
            .execute(&claimed("valve_lookup", json!({"component": 7})), deps)
            .await
            .unwrap_err();
        assert!(malformed.to_string().contains("malformed valve_lookup payload"));
    }
}
