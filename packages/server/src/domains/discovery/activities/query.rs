//! Synchronous discovery actions
//!
//! search -> persist envelope -> extract -> (evaluate) -> persist records,
//! run inline for the request that asked for it.

use tracing::{info, warn};
use uuid::Uuid;

use crate::domains::discovery::error::{DiscoveryError, DiscoveryResult};
use crate::domains::discovery::models::RawSearchResult;
use crate::domains::suppliers::models::{SupplierFilter, SupplierRecord};
use crate::kernel::ServerDeps;

/// Outcome of extracting and persisting one search result.
#[derive(Debug)]
pub struct ProcessedSearch {
    pub search_result: RawSearchResult,
    /// Records produced by extraction, fallback records included
    pub extracted: usize,
    /// Records that were actually stored
    pub saved: Vec<SupplierRecord>,
}

/// Trimmed query terms, or `InvalidInput` when either is blank.
pub fn validate_query(component: &str, country: &str) -> DiscoveryResult<(String, String)> {
    let component = component.trim();
    let country = country.trim();
    if component.is_empty() {
        return Err(DiscoveryError::InvalidInput("component must not be empty".into()));
    }
    if country.is_empty() {
        return Err(DiscoveryError::InvalidInput("country must not be empty".into()));
    }
    Ok((component.to_string(), country.to_string()))
}

/// Run a full supplier search inline and return the stored records.
pub async fn query_suppliers(
    component: &str,
    country: &str,
    evaluate: bool,
    deps: &ServerDeps,
) -> DiscoveryResult<Vec<SupplierRecord>> {
    let (component, country) = validate_query(component, country)?;

    let result = deps.searcher.search(&component, &country).await?;
    let result = deps.search_results.insert_search_result(&result).await?;

    let processed = process_search_result(result, evaluate, deps).await?;
    Ok(processed.saved)
}

/// Extract suppliers from a stored search result and persist them.
///
/// Individual record inserts may fail without aborting the batch; only the
/// records that were stored are returned.
pub async fn process_search_result(
    mut result: RawSearchResult,
    evaluate: bool,
    deps: &ServerDeps,
) -> DiscoveryResult<ProcessedSearch> {
    let mut records = deps.extractor.extract(&mut result).await;

    if evaluate {
        let pending: Vec<&mut SupplierRecord> =
            records.iter_mut().filter(|r| r.summary.is_none()).collect();
        deps.evaluator.evaluate_batch(pending).await;
    }

    let extracted = records.len();
    let mut saved = Vec::with_capacity(extracted);
    for record in &records {
        match deps.suppliers.insert_supplier(record).await {
            Ok(stored) => saved.push(stored),
            Err(e) => warn!(
                search_result_id = %result.id,
                supplier = %record.name,
                error = %e,
                "failed to save supplier, continuing"
            ),
        }
    }

    if let Err(e) = deps.search_results.mark_search_result_processed(&result).await {
        warn!(search_result_id = %result.id, error = %e, "failed to persist processed flag");
    }

    info!(
        search_result_id = %result.id,
        component = %result.query_component,
        country = %result.query_country,
        extracted,
        saved = saved.len(),
        "search result processed"
    );

    Ok(ProcessedSearch {
        search_result: result,
        extracted,
        saved,
    })
}

pub async fn get_search_result(id: Uuid, deps: &ServerDeps) -> DiscoveryResult<RawSearchResult> {
    deps.search_results
        .find_search_result(id)
        .await?
        .ok_or(DiscoveryError::NotFound {
            kind: "search result",
            id,
        })
}

/// Re-run extraction on a stored search result.
///
/// Already-processed results are extracted again and yield a fresh record set.
pub async fn extract_search_result(
    id: Uuid,
    evaluate: bool,
    deps: &ServerDeps,
) -> DiscoveryResult<Vec<SupplierRecord>> {
    let result = get_search_result(id, deps).await?;
    if result.is_processed {
        info!(search_result_id = %id, "search result already processed, extracting again");
    }

    let processed = process_search_result(result, evaluate, deps).await?;
    Ok(processed.saved)
}

/// Stored suppliers matching `filter`; the newest `limit` when one is given.
pub async fn list_suppliers(
    filter: &SupplierFilter,
    limit: Option<i64>,
    deps: &ServerDeps,
) -> DiscoveryResult<Vec<SupplierRecord>> {
    let suppliers = match limit {
        Some(limit) if limit < 1 => {
            return Err(DiscoveryError::InvalidInput("limit must be positive".into()))
        }
        Some(limit) => deps.suppliers.find_recent_suppliers(filter, limit).await?,
        None => deps.suppliers.find_suppliers(filter).await?,
    };
    Ok(suppliers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{search_response, supplier_tool_response, MockAI, TestDependencies};
    use anthropic_client::ErrorClass;
    use serde_json::json;

    #[test]
    fn blank_terms_are_rejected() {
        assert!(matches!(
            validate_query("  ", "Germany"),
            Err(DiscoveryError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_query("bearings", ""),
            Err(DiscoveryError::InvalidInput(_))
        ));
        assert_eq!(
            validate_query(" bearings ", "Germany\n").unwrap(),
            ("bearings".to_string(), "Germany".to_string())
        );
    }

    #[tokio::test]
    async fn query_persists_envelope_and_records() {
        let test_deps = TestDependencies::new().mock_ai(
            MockAI::new()
                .with_response(search_response("1. Acme Manufacturer\nWebsite: acme.de"))
                .with_response(supplier_tool_response(vec![
                    json!({"name": "Acme"}),
                    json!({"name": "Beta"}),
                ])),
        );
        let deps = test_deps.server_deps();

        let records = query_suppliers("bearings", "Germany", false, &deps).await.unwrap();

        assert_eq!(records.len(), 2);
        let stored = test_deps.store.search_results();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_processed);
        assert!(records.iter().all(|r| r.search_result_id == Some(stored[0].id)));
    }

    #[tokio::test]
    async fn query_surfaces_search_errors_without_persisting() {
        let test_deps = TestDependencies::new()
            .mock_ai(MockAI::new().with_error(ErrorClass::Authentication, "invalid x-api-key"));
        let deps = test_deps.server_deps();

        let err = query_suppliers("bearings", "Germany", false, &deps).await.unwrap_err();

        assert!(matches!(err, DiscoveryError::Search(_)));
        assert!(test_deps.store.search_results().is_empty());
        assert!(test_deps.store.suppliers().is_empty());
    }

    #[tokio::test]
    async fn failed_inserts_are_skipped_not_fatal() {
        let test_deps = TestDependencies::new().mock_ai(
            MockAI::new()
                .with_response(search_response("research"))
                .with_response(supplier_tool_response(vec![
                    json!({"name": "Acme"}),
                    json!({"name": "Broken"}),
                    json!({"name": "Gamma"}),
                ])),
        );
        test_deps.store.fail_supplier_inserts_named("Broken");
        let deps = test_deps.server_deps();

        let records = query_suppliers("bearings", "Germany", false, &deps).await.unwrap();

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Gamma"]);
    }

    #[tokio::test]
    async fn evaluation_only_fills_missing_summaries() {
        let test_deps = TestDependencies::new().mock_ai(
            MockAI::new()
                .with_response(search_response("research"))
                .with_response(supplier_tool_response(vec![
                    json!({"name": "Acme", "summary": "Given by the model."}),
                    json!({"name": "Beta"}),
                ]))
                .with_response(search_response("Reliable mid-size supplier.")),
        );
        let deps = test_deps.server_deps();

        let records = query_suppliers("bearings", "Germany", true, &deps).await.unwrap();

        assert_eq!(test_deps.ai.calls().len(), 3);
        assert_eq!(records[0].summary.as_deref(), Some("Given by the model."));
        assert_eq!(records[1].summary.as_deref(), Some("Reliable mid-size supplier."));
    }

    #[tokio::test]
    async fn evaluating_query_runs_on_a_spawned_task() {
        let test_deps = TestDependencies::new().mock_ai(
            MockAI::new()
                .with_response(search_response("research"))
                .with_response(supplier_tool_response(vec![json!({"name": "Acme"})]))
                .with_response(search_response("Solid regional supplier.")),
        );
        let deps = test_deps.server_deps();

        let records = tokio::spawn(async move { query_suppliers("valves", "Italy", true, &deps).await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].summary.as_deref(), Some("Solid regional supplier."));
    }

    #[tokio::test]
    async fn extract_unknown_search_result_is_not_found() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();

        let err = extract_search_result(Uuid::now_v7(), false, &deps).await.unwrap_err();

        assert!(matches!(err, DiscoveryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_rejects_non_positive_limit() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();

        let err = list_suppliers(&SupplierFilter::default(), Some(0), &deps)
            .await
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::InvalidInput(_)));
    }
}
