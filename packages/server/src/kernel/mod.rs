//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod jobs;
pub mod store;
pub mod test_dependencies;
pub mod traits;

pub use deps::{BaseStore, PipelineSettings, ServerDeps};
pub use store::PostgresStore;
pub use test_dependencies::TestDependencies;
pub use traits::*;
