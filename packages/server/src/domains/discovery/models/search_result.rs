//! RawSearchResult model
//!
//! The text-only envelope of one web-search model call, kept so extraction
//! can be re-run against it later.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// One `{text}` fragment of model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RawSearchResult {
    pub id: Uuid,
    pub query_component: String,
    pub query_country: String,
    /// JSON array of `TextFragment`s
    pub raw_ai_response: String,
    pub search_date: DateTime<Utc>,
    pub is_processed: bool,
}

impl RawSearchResult {
    pub fn new(
        query_component: impl Into<String>,
        query_country: impl Into<String>,
        fragments: &[TextFragment],
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: Uuid::now_v7(),
            query_component: query_component.into(),
            query_country: query_country.into(),
            raw_ai_response: serde_json::to_string(fragments)?,
            search_date: Utc::now(),
            is_processed: false,
        })
    }

    /// Decode the stored envelope back into its fragments.
    pub fn fragments(&self) -> serde_json::Result<Vec<TextFragment>> {
        serde_json::from_str(&self.raw_ai_response)
    }

    /// All fragment text joined with blank lines, in the order it was produced.
    pub fn text_content(&self) -> serde_json::Result<String> {
        Ok(self
            .fragments()?
            .into_iter()
            .map(|fragment| fragment.text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO search_results
                (id, query_component, query_country, raw_ai_response, search_date, is_processed)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(self.id)
        .bind(&self.query_component)
        .bind(&self.query_country)
        .bind(&self.raw_ai_response)
        .bind(self.search_date)
        .bind(self.is_processed)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Persist the processed flag. The envelope itself never changes after insert.
    pub async fn mark_processed(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE search_results SET is_processed = $2 WHERE id = $1 RETURNING *",
        )
        .bind(self.id)
        .bind(self.is_processed)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM search_results WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}
