// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (search, extraction, task runs) lives in domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseAI, BaseSupplierStore)

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use anthropic_client::{MessageRequest, MessageResponse};

use crate::domains::discovery::models::{RawSearchResult, SupplierTask};
use crate::domains::suppliers::models::{SupplierFilter, SupplierRecord};

// =============================================================================
// AI Trait (Infrastructure - Messages API)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Send one Messages API request.
    ///
    /// Errors keep their structured class so callers can decide on retries
    /// without looking at message text.
    async fn create_message(
        &self,
        request: MessageRequest,
    ) -> anthropic_client::Result<MessageResponse>;
}

// =============================================================================
// Store Traits (Infrastructure - persistence)
// =============================================================================

#[async_trait]
pub trait BaseSearchResultStore: Send + Sync {
    async fn insert_search_result(&self, result: &RawSearchResult) -> Result<RawSearchResult>;

    /// Persist `is_processed`; nothing else on a search result ever changes.
    async fn mark_search_result_processed(&self, result: &RawSearchResult) -> Result<()>;

    async fn find_search_result(&self, id: Uuid) -> Result<Option<RawSearchResult>>;
}

#[async_trait]
pub trait BaseSupplierStore: Send + Sync {
    async fn insert_supplier(&self, supplier: &SupplierRecord) -> Result<SupplierRecord>;

    /// Matching suppliers, oldest first.
    async fn find_suppliers(&self, filter: &SupplierFilter) -> Result<Vec<SupplierRecord>>;

    /// Matching suppliers, newest first, at most `limit`.
    async fn find_recent_suppliers(
        &self,
        filter: &SupplierFilter,
        limit: i64,
    ) -> Result<Vec<SupplierRecord>>;
}

#[async_trait]
pub trait BaseTaskStore: Send + Sync {
    async fn insert_task(&self, task: &SupplierTask) -> Result<SupplierTask>;

    /// Fails if the stored task is already completed or failed.
    async fn update_task(&self, task: &SupplierTask) -> Result<SupplierTask>;

    async fn find_task(&self, id: Uuid) -> Result<Option<SupplierTask>>;
}
