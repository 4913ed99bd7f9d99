//! Discovery domain models.

pub mod search_result;
pub mod task;

pub use search_result::*;
pub use task::*;
