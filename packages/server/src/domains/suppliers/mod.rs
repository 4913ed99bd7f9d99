//! Suppliers domain - turning search output into supplier records and
//! annotating them with evaluations.

pub mod evaluation;
pub mod extraction;
pub mod models;
pub mod prompts;

pub use evaluation::{EvaluationSettings, SupplierEvaluator, EVALUATION_UNAVAILABLE};
pub use extraction::{ExtractionError, ExtractionSettings, SupplierExtractor};
pub use models::*;
