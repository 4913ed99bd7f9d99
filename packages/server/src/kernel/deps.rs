//! Server dependencies for domain actions (using traits for testability)
//!
//! This module provides the central dependency container used by all domain actions.
//! All external services use trait abstractions to enable testing.

use std::sync::Arc;

use crate::domains::discovery::{SearchSettings, SupplierSearcher, TaskSettings};
use crate::domains::suppliers::{
    EvaluationSettings, ExtractionSettings, SupplierEvaluator, SupplierExtractor,
};
use crate::kernel::jobs::JobQueue;
use crate::kernel::{BaseAI, BaseSearchResultStore, BaseSupplierStore, BaseTaskStore};

/// Anything that can back all three stores.
pub trait BaseStore: BaseSearchResultStore + BaseSupplierStore + BaseTaskStore {}

impl<T> BaseStore for T where T: BaseSearchResultStore + BaseSupplierStore + BaseTaskStore {}

/// Model settings for the three pipeline components.
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub search: SearchSettings,
    pub extraction: ExtractionSettings,
    pub evaluation: EvaluationSettings,
    pub tasks: TaskSettings,
}

/// Server dependencies accessible to domain actions
#[derive(Clone)]
pub struct ServerDeps {
    pub ai: Arc<dyn BaseAI>,
    pub search_results: Arc<dyn BaseSearchResultStore>,
    pub suppliers: Arc<dyn BaseSupplierStore>,
    pub tasks: Arc<dyn BaseTaskStore>,
    pub job_queue: Arc<dyn JobQueue>,
    pub searcher: Arc<SupplierSearcher>,
    pub extractor: Arc<SupplierExtractor>,
    pub evaluator: Arc<SupplierEvaluator>,
    pub task_settings: TaskSettings,
}

impl ServerDeps {
    /// Wire the pipeline components around one AI client and one store.
    pub fn new<S>(
        ai: Arc<dyn BaseAI>,
        store: Arc<S>,
        job_queue: Arc<dyn JobQueue>,
        settings: PipelineSettings,
    ) -> Self
    where
        S: BaseStore + 'static,
    {
        Self {
            searcher: Arc::new(SupplierSearcher::new(ai.clone(), settings.search)),
            extractor: Arc::new(SupplierExtractor::new(ai.clone(), settings.extraction)),
            evaluator: Arc::new(SupplierEvaluator::new(ai.clone(), settings.evaluation)),
            ai,
            search_results: store.clone(),
            suppliers: store.clone(),
            tasks: store,
            job_queue,
            task_settings: settings.tasks,
        }
    }
}
