//! SupplierRecord model - the canonical output of extraction.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use typed_builder::TypedBuilder;
use uuid::Uuid;

pub const UNKNOWN_SUPPLIER_NAME: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct SupplierRecord {
    #[builder(default = Uuid::now_v7())]
    pub id: Uuid,

    /// RawSearchResult this record was extracted from
    #[builder(default)]
    pub search_result_id: Option<Uuid>,

    #[builder(default = UNKNOWN_SUPPLIER_NAME.to_string())]
    pub name: String,
    #[builder(default)]
    pub website: Option<String>,
    #[builder(default)]
    pub location: Option<String>,
    #[builder(default)]
    pub product: Option<String>,

    // Copied from the query, never taken from model output
    pub component_type: String,
    pub country: String,

    #[builder(default)]
    pub lead_time_days: Option<i32>,
    #[builder(default)]
    pub min_order_qty: Option<i32>,
    #[builder(default)]
    pub certifications: Vec<String>,

    #[builder(default)]
    pub summary: Option<String>,
    pub raw_ai_source: String,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

/// Equality filter over supplier fields. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SupplierFilter {
    pub component_type: Option<String>,
    pub country: Option<String>,
    pub search_result_id: Option<Uuid>,
}

impl SupplierFilter {
    pub fn for_query(component: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            component_type: Some(component.into()),
            country: Some(country.into()),
            search_result_id: None,
        }
    }

    pub fn matches(&self, supplier: &SupplierRecord) -> bool {
        self.component_type
            .as_ref()
            .map_or(true, |c| *c == supplier.component_type)
            && self.country.as_ref().map_or(true, |c| *c == supplier.country)
            && self
                .search_result_id
                .map_or(true, |id| supplier.search_result_id == Some(id))
    }

    fn push_where(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE TRUE");
        if let Some(component) = &self.component_type {
            query.push(" AND component_type = ").push_bind(component.clone());
        }
        if let Some(country) = &self.country {
            query.push(" AND country = ").push_bind(country.clone());
        }
        if let Some(id) = self.search_result_id {
            query.push(" AND search_result_id = ").push_bind(id);
        }
    }
}

impl SupplierRecord {
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO suppliers
                (id, search_result_id, name, website, location, product, component_type, country,
                 lead_time_days, min_order_qty, certifications, summary, raw_ai_source, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.search_result_id)
        .bind(&self.name)
        .bind(&self.website)
        .bind(&self.location)
        .bind(&self.product)
        .bind(&self.component_type)
        .bind(&self.country)
        .bind(self.lead_time_days)
        .bind(self.min_order_qty)
        .bind(&self.certifications)
        .bind(&self.summary)
        .bind(&self.raw_ai_source)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find(filter: &SupplierFilter, pool: &PgPool) -> Result<Vec<Self>> {
        let mut query = QueryBuilder::new("SELECT * FROM suppliers");
        filter.push_where(&mut query);
        query.push(" ORDER BY created_at ASC");

        query
            .build_query_as::<Self>()
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Newest first, at most `limit` rows.
    pub async fn find_recent(filter: &SupplierFilter, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let mut query = QueryBuilder::new("SELECT * FROM suppliers");
        filter.push_where(&mut query);
        query.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

        query
            .build_query_as::<Self>()
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
