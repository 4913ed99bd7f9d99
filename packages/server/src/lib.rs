// Procurement Research - API Core
//
// AI-assisted supplier research: web search through the Anthropic Messages
// API, extraction of supplier records from the model output, optional
// evaluations, and queued tasks that run the whole pipeline in the background.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
