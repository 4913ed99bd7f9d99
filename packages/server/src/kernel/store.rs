// Postgres implementation of the store traits
//
// Thin delegation to the model methods; the SQL lives with the models.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{BaseSearchResultStore, BaseSupplierStore, BaseTaskStore};
use crate::domains::discovery::models::{RawSearchResult, SupplierTask};
use crate::domains::suppliers::models::{SupplierFilter, SupplierRecord};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseSearchResultStore for PostgresStore {
    async fn insert_search_result(&self, result: &RawSearchResult) -> Result<RawSearchResult> {
        result.insert(&self.pool).await
    }

    async fn mark_search_result_processed(&self, result: &RawSearchResult) -> Result<()> {
        result.mark_processed(&self.pool).await.map(|_| ())
    }

    async fn find_search_result(&self, id: Uuid) -> Result<Option<RawSearchResult>> {
        RawSearchResult::find_by_id(id, &self.pool).await
    }
}

#[async_trait]
impl BaseSupplierStore for PostgresStore {
    async fn insert_supplier(&self, supplier: &SupplierRecord) -> Result<SupplierRecord> {
        supplier.insert(&self.pool).await
    }

    async fn find_suppliers(&self, filter: &SupplierFilter) -> Result<Vec<SupplierRecord>> {
        SupplierRecord::find(filter, &self.pool).await
    }

    async fn find_recent_suppliers(
        &self,
        filter: &SupplierFilter,
        limit: i64,
    ) -> Result<Vec<SupplierRecord>> {
        SupplierRecord::find_recent(filter, limit, &self.pool).await
    }
}

#[async_trait]
impl BaseTaskStore for PostgresStore {
    async fn insert_task(&self, task: &SupplierTask) -> Result<SupplierTask> {
        task.insert(&self.pool).await
    }

    async fn update_task(&self, task: &SupplierTask) -> Result<SupplierTask> {
        task.update(&self.pool).await
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<SupplierTask>> {
        SupplierTask::find_by_id(id, &self.pool).await
    }
}
