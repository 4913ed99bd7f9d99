//! Discovery domain - AI web search for suppliers and the tasks that run it

pub mod activities;
pub mod error;
pub mod jobs;
pub mod models;
pub mod prompts;
pub mod search;

// Re-export actions
pub use activities::{
    enqueue_supplier_task, extract_search_result, get_search_result, get_task, list_suppliers,
    query_suppliers, run_supplier_task, task_results, TaskSettings,
};
pub use error::{DiscoveryError, DiscoveryResult};
pub use search::{SearchSettings, SupplierSearcher};

// Re-export models
pub use models::{RawSearchResult, SupplierTask, TaskStatus, TextFragment, TransitionError};
