//! Extraction through the public pipeline, with the model mocked.

mod common;

use std::sync::Arc;

use anthropic_client::{ErrorClass, MessageResponse};
use common::{bearing_extraction, BEARINGS_RESEARCH};
use procurement_core::domains::discovery::models::{RawSearchResult, TextFragment};
use procurement_core::domains::suppliers::{ExtractionSettings, SupplierExtractor};
use procurement_core::kernel::test_dependencies::{search_response, MockAI};

fn extractor(ai: MockAI) -> SupplierExtractor {
    SupplierExtractor::new(Arc::new(ai), ExtractionSettings::default())
}

fn bearings_result(text: &str) -> RawSearchResult {
    RawSearchResult::new(
        "bearings",
        "Germany",
        &[TextFragment {
            text: text.to_string(),
        }],
    )
    .unwrap()
}

#[tokio::test]
async fn each_tool_item_becomes_one_record() {
    let mut result = bearings_result(BEARINGS_RESEARCH);

    let records = extractor(MockAI::new().with_response(bearing_extraction()))
        .extract(&mut result)
        .await;

    assert_eq!(records.len(), 3);
    assert!(result.is_processed);
    for record in &records {
        assert_eq!(record.component_type, "bearings");
        assert_eq!(record.country, "Germany");
        assert_eq!(record.search_result_id, Some(result.id));
    }
}

#[tokio::test]
async fn websites_lose_their_scheme_and_counts_are_parsed() {
    let mut result = bearings_result(BEARINGS_RESEARCH);

    let records = extractor(MockAI::new().with_response(bearing_extraction()))
        .extract(&mut result)
        .await;

    assert_eq!(records[0].website.as_deref(), Some("www.schaeffler.com"));
    assert_eq!(records[0].lead_time_days, Some(42));
    assert_eq!(records[2].website.as_deref(), Some("nke.at"));
    assert_eq!(records[2].min_order_qty, Some(500));
}

#[tokio::test]
async fn reply_without_tool_call_falls_back_to_text_parsing() {
    let mut result = bearings_result(BEARINGS_RESEARCH);

    let records = extractor(MockAI::new().with_response(search_response("I could not help.")))
        .extract(&mut result)
        .await;

    // The preamble before the first numbered entry is kept as its own record
    assert_eq!(records.len(), 4);
    let schaeffler = &records[1];
    assert!(schaeffler.name.contains("Schaeffler"));
    assert_eq!(schaeffler.location.as_deref(), Some("Herzogenaurach"));
    assert_eq!(schaeffler.certifications, vec!["ISO 9001 certified".to_string()]);
}

#[tokio::test]
async fn duplicate_certifications_are_kept_once() {
    let text = "\
1. Duplicate Bearings - Supplier
Website: dup.example
ISO 9001 certified
ISO 9001 certified
";
    let mut result = bearings_result(text);

    let records = extractor(MockAI::new().with_response(MessageResponse::from_blocks(vec![])))
        .extract(&mut result)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].certifications, vec!["ISO 9001 certified".to_string()]);
}

#[tokio::test]
async fn empty_search_text_yields_a_placeholder_without_calling_the_model() {
    let ai = Arc::new(MockAI::new());
    let mut result = bearings_result("   ");

    let records = SupplierExtractor::new(ai.clone(), ExtractionSettings::default())
        .extract(&mut result)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "AI Search Results: bearings in Germany");
    assert!(ai.calls().is_empty());
    assert!(result.is_processed);
}

#[tokio::test]
async fn model_failure_yields_an_error_record() {
    let mut result = bearings_result(BEARINGS_RESEARCH);

    let records = extractor(MockAI::new().failing_with(ErrorClass::Server))
        .extract(&mut result)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Error Processing: bearings in Germany");
    assert!(records[0]
        .summary
        .as_deref()
        .is_some_and(|s| s.starts_with("Error occurred while processing search results")));
    assert!(result.is_processed);
}
