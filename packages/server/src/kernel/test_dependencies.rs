// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anthropic_client::{
    AnthropicError, ContentBlock, ErrorClass, MessageRequest, MessageResponse,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::deps::PipelineSettings;
use super::jobs::{ClaimedJob, EnqueueResult, Job, JobQueue, JobStatus};
use super::{BaseAI, BaseSearchResultStore, BaseSupplierStore, BaseTaskStore, ServerDeps};
use crate::domains::discovery::models::{RawSearchResult, SupplierTask, TaskStatus};
use crate::domains::discovery::TaskSettings;
use crate::domains::suppliers::extraction::RECORD_SUPPLIERS_TOOL;
use crate::domains::suppliers::models::{SupplierFilter, SupplierRecord};

// =============================================================================
// Canned responses
// =============================================================================

/// A reply made of a single text block.
pub fn search_response(text: &str) -> MessageResponse {
    MessageResponse::from_blocks(vec![ContentBlock::text(text)])
}

/// A reply carrying one `record_suppliers` call with these items.
pub fn supplier_tool_response(suppliers: Vec<serde_json::Value>) -> MessageResponse {
    MessageResponse::from_blocks(vec![ContentBlock::tool_invocation(
        "toolu_test",
        RECORD_SUPPLIERS_TOOL,
        serde_json::json!({ "suppliers": suppliers }),
    )])
}

/// An error of the given class, shaped the way the client would produce it.
pub fn error_of_class(class: ErrorClass, message: &str) -> AnthropicError {
    let message = message.to_string();
    match class {
        ErrorClass::Configuration => AnthropicError::Config(message),
        ErrorClass::Timeout => AnthropicError::Network {
            message,
            timed_out: true,
        },
        ErrorClass::Network => AnthropicError::Network {
            message,
            timed_out: false,
        },
        ErrorClass::Other => AnthropicError::Parse(message),
        ErrorClass::Authentication => AnthropicError::api(401, message),
        ErrorClass::RateLimited => AnthropicError::api(429, message),
        ErrorClass::Server => AnthropicError::api(529, message),
        ErrorClass::InvalidRequest => AnthropicError::api(400, message),
    }
}

// =============================================================================
// Mock AI
// =============================================================================

enum Scripted {
    Response(MessageResponse),
    Error(ErrorClass, String),
}

/// Replays scripted replies in order and records every request.
///
/// Once the script runs out it answers with a short text reply, unless
/// `failing_with` was set, in which case every call fails.
pub struct MockAI {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    persistent_error: Arc<Mutex<Option<ErrorClass>>>,
    calls: Arc<Mutex<Vec<MessageRequest>>>,
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            persistent_error: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful reply
    pub fn with_response(self, response: MessageResponse) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Response(response));
        self
    }

    /// Queue one failure
    pub fn with_error(self, class: ErrorClass, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Error(class, message.to_string()));
        self
    }

    /// Fail every call with this class
    pub fn failing_with(self, class: ErrorClass) -> Self {
        *self.persistent_error.lock().unwrap() = Some(class);
        self
    }

    /// Every request sent so far, oldest first
    pub fn calls(&self) -> Vec<MessageRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn create_message(
        &self,
        request: MessageRequest,
    ) -> anthropic_client::Result<MessageResponse> {
        self.calls.lock().unwrap().push(request);

        if let Some(class) = *self.persistent_error.lock().unwrap() {
            return Err(error_of_class(class, "mock failure"));
        }

        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Error(class, message)) => Err(error_of_class(class, &message)),
            None => Ok(search_response("Mock AI response")),
        }
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// All three stores in memory, with the same terminal-task guard as Postgres.
#[derive(Default)]
pub struct InMemoryStore {
    search_results: Mutex<Vec<RawSearchResult>>,
    suppliers: Mutex<Vec<SupplierRecord>>,
    tasks: Mutex<Vec<SupplierTask>>,
    failing_supplier_names: Mutex<HashSet<String>>,
    failing_task_updates: Mutex<Vec<TaskStatus>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make inserts of suppliers with this name fail
    pub fn fail_supplier_inserts_named(&self, name: &str) {
        self.failing_supplier_names
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    /// Make the next task update that writes `status` fail, once
    pub fn fail_next_task_update_to(&self, status: TaskStatus) {
        self.failing_task_updates.lock().unwrap().push(status);
    }

    pub fn search_results(&self) -> Vec<RawSearchResult> {
        self.search_results.lock().unwrap().clone()
    }

    pub fn suppliers(&self) -> Vec<SupplierRecord> {
        self.suppliers.lock().unwrap().clone()
    }

    pub fn tasks(&self) -> Vec<SupplierTask> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseSearchResultStore for InMemoryStore {
    async fn insert_search_result(&self, result: &RawSearchResult) -> Result<RawSearchResult> {
        self.search_results.lock().unwrap().push(result.clone());
        Ok(result.clone())
    }

    async fn mark_search_result_processed(&self, result: &RawSearchResult) -> Result<()> {
        let mut results = self.search_results.lock().unwrap();
        let stored = results
            .iter_mut()
            .find(|r| r.id == result.id)
            .ok_or_else(|| anyhow!("search result {} not found", result.id))?;
        stored.is_processed = result.is_processed;
        Ok(())
    }

    async fn find_search_result(&self, id: Uuid) -> Result<Option<RawSearchResult>> {
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }
}

#[async_trait]
impl BaseSupplierStore for InMemoryStore {
    async fn insert_supplier(&self, supplier: &SupplierRecord) -> Result<SupplierRecord> {
        if self
            .failing_supplier_names
            .lock()
            .unwrap()
            .contains(&supplier.name)
        {
            return Err(anyhow!("insert failed for supplier {}", supplier.name));
        }
        self.suppliers.lock().unwrap().push(supplier.clone());
        Ok(supplier.clone())
    }

    async fn find_suppliers(&self, filter: &SupplierFilter) -> Result<Vec<SupplierRecord>> {
        Ok(self
            .suppliers
            .lock()
            .unwrap()
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn find_recent_suppliers(
        &self,
        filter: &SupplierFilter,
        limit: i64,
    ) -> Result<Vec<SupplierRecord>> {
        Ok(self
            .suppliers
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|s| filter.matches(s))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseTaskStore for InMemoryStore {
    async fn insert_task(&self, task: &SupplierTask) -> Result<SupplierTask> {
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task.clone())
    }

    async fn update_task(&self, task: &SupplierTask) -> Result<SupplierTask> {
        {
            let mut failing = self.failing_task_updates.lock().unwrap();
            if let Some(pos) = failing.iter().position(|s| *s == task.status) {
                failing.remove(pos);
                return Err(anyhow!("task update to {} failed", task.status));
            }
        }
        let mut tasks = self.tasks.lock().unwrap();
        let stored = tasks
            .iter_mut()
            .find(|t| t.id == task.id && !t.status.is_terminal())
            .ok_or_else(|| anyhow!("task {} not found or already in a terminal state", task.id))?;
        *stored = task.clone();
        Ok(task.clone())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<SupplierTask>> {
        Ok(self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }
}

// =============================================================================
// In-memory job queue
// =============================================================================

#[derive(Default)]
pub struct InMemoryJobQueue {
    jobs: Mutex<Vec<Job>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn job(&self, id: Uuid) -> Option<Job> {
        self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned()
    }

    /// Payloads of every job that deserializes as `C`
    pub fn enqueued<C: DeserializeOwned>(&self) -> Vec<C> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .filter_map(|j| serde_json::from_value(j.args.clone()).ok())
            .collect()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn push(&self, job: Job) -> Result<EnqueueResult> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(key) = &job.idempotency_key {
            if let Some(existing) = jobs
                .iter()
                .find(|j| j.is_live() && j.idempotency_key.as_ref() == Some(key))
            {
                return Ok(EnqueueResult::Duplicate(existing.id));
            }
        }
        let id = job.id;
        jobs.push(job);
        Ok(EnqueueResult::Created(id))
    }

    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedJob>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let mut jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter_mut()
            .filter(|j| j.status == JobStatus::Pending)
            .take(limit)
            .map(|job| {
                job.status = JobStatus::Running;
                job.attempts += 1;
                job.worker_id = Some(worker_id.to_string());
                ClaimedJob {
                    id: job.id,
                    job: job.clone(),
                }
            })
            .collect())
    }

    async fn mark_succeeded(&self, job_id: Uuid) -> Result<()> {
        self.set_status(job_id, JobStatus::Succeeded, None)
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<()> {
        self.set_status(job_id, JobStatus::Failed, Some(error.to_string()))
    }
}

impl InMemoryJobQueue {
    fn set_status(&self, id: Uuid, status: JobStatus, error: Option<String>) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| anyhow!("job {} not found", id))?;
        job.status = status;
        job.error_message = error;
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub ai: Arc<MockAI>,
    pub store: Arc<InMemoryStore>,
    pub job_queue: Arc<InMemoryJobQueue>,
    pub settings: PipelineSettings,
}

impl TestDependencies {
    /// Mocks everywhere; retries happen without waiting.
    pub fn new() -> Self {
        Self {
            ai: Arc::new(MockAI::new()),
            store: Arc::new(InMemoryStore::new()),
            job_queue: Arc::new(InMemoryJobQueue::new()),
            settings: PipelineSettings {
                tasks: TaskSettings {
                    retry_backoff: Duration::ZERO,
                    ..TaskSettings::default()
                },
                ..PipelineSettings::default()
            },
        }
    }

    /// Set a mock AI
    pub fn mock_ai(mut self, ai: MockAI) -> Self {
        self.ai = Arc::new(ai);
        self
    }

    /// Override task retry/evaluation settings
    pub fn task_settings(mut self, tasks: TaskSettings) -> Self {
        self.settings.tasks = tasks;
        self
    }

    /// Build ServerDeps sharing this instance's mocks
    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.ai.clone(),
            self.store.clone(),
            self.job_queue.clone(),
            self.settings.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
