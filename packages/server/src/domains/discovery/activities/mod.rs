//! Discovery domain actions
//!
//! - `query`: synchronous search + extract + persist, on-demand extraction, listing
//! - `tasks`: queued supplier tasks and the worker body that drives them

pub mod query;
pub mod tasks;

pub use query::{
    extract_search_result, get_search_result, list_suppliers, process_search_result,
    query_suppliers, ProcessedSearch,
};
pub use tasks::{enqueue_supplier_task, get_task, run_supplier_task, task_results, TaskSettings};
