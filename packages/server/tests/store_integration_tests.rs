//! Postgres store and job queue against a real database.

mod common;

use std::sync::Arc;

use anthropic_client::ErrorClass;
use common::{bearing_extraction, TestHarness, BEARINGS_RESEARCH};
use procurement_core::domains::discovery::jobs::SupplierSearchJob;
use procurement_core::domains::discovery::models::{RawSearchResult, SupplierTask, TextFragment};
use procurement_core::domains::discovery::{
    enqueue_supplier_task, query_suppliers, task_results, TaskStatus,
};
use procurement_core::domains::suppliers::models::{SupplierFilter, SupplierRecord};
use procurement_core::kernel::jobs::{
    build_job_registry, Job, JobRunner, JobStatus, PostgresJobQueue,
};
use procurement_core::kernel::test_dependencies::{search_response, MockAI};
use procurement_core::kernel::{
    BaseSearchResultStore, BaseSupplierStore, BaseTaskStore, PipelineSettings, ServerDeps,
};
use test_context::test_context;
use uuid::Uuid;

fn server_deps(ctx: &TestHarness, ai: MockAI) -> ServerDeps {
    let mut settings = PipelineSettings::default();
    settings.tasks.retry_backoff = std::time::Duration::ZERO;
    ServerDeps::new(
        Arc::new(ai),
        Arc::new(ctx.store()),
        Arc::new(PostgresJobQueue::new(ctx.db_pool.clone())),
        settings,
    )
}

#[test_context(TestHarness)]
#[tokio::test]
async fn search_result_round_trips_and_marks_processed(ctx: &TestHarness) {
    let store = ctx.store();
    let component = "valves".to_string();
    let mut result = RawSearchResult::new(
        &component,
        "Italy",
        &[TextFragment {
            text: "Valve makers".into(),
        }],
    )
    .unwrap();

    store.insert_search_result(&result).await.unwrap();
    result.is_processed = true;
    store.mark_search_result_processed(&result).await.unwrap();

    let found = store.find_search_result(result.id).await.unwrap().unwrap();
    assert!(found.is_processed);
    assert_eq!(found.query_component, component);
    assert_eq!(found.text_content().unwrap(), "Valve makers");
    assert!(store.find_search_result(Uuid::now_v7()).await.unwrap().is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn suppliers_keep_their_certifications_and_filter_by_query(ctx: &TestHarness) {
    let store = ctx.store();
    let component = "gears".to_string();

    for (name, country) in [("A", "Japan"), ("B", "Japan"), ("C", "Korea")] {
        let record = SupplierRecord::builder()
            .name(name)
            .component_type(component.clone())
            .country(country)
            .certifications(vec!["ISO 9001".to_string(), "IATF 16949".to_string()])
            .lead_time_days(Some(30))
            .raw_ai_source("{}")
            .build();
        store.insert_supplier(&record).await.unwrap();
    }

    let japan = SupplierFilter::for_query(&component, "Japan");
    let all = store.find_suppliers(&japan).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].certifications, vec!["ISO 9001", "IATF 16949"]);
    assert_eq!(all[0].lead_time_days, Some(30));

    let recent = store.find_recent_suppliers(&japan, 1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].name, "B");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn terminal_task_rows_cannot_be_updated(ctx: &TestHarness) {
    let store = ctx.store();
    let mut task = SupplierTask::new("pumps".to_string(), "Spain");
    store.insert_task(&task).await.unwrap();

    task.start().unwrap();
    store.update_task(&task).await.unwrap();
    task.fail("model rejected the key").unwrap();
    store.update_task(&task).await.unwrap();

    let mut forged = task.clone();
    forged.status = TaskStatus::Completed;
    forged.message = "Completed".into();
    assert!(store.update_task(&forged).await.is_err());

    let stored = store.find_task(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Failed);
    assert!(stored.completed_at.is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn query_persists_three_processed_suppliers(ctx: &TestHarness) {
    let component = "bearings".to_string();
    let deps = server_deps(
        ctx,
        MockAI::new()
            .with_response(search_response(BEARINGS_RESEARCH))
            .with_response(bearing_extraction()),
    );

    let records = query_suppliers(&component, "Germany", false, &deps).await.unwrap();
    assert_eq!(records.len(), 3);

    let result_id = records[0].search_result_id.unwrap();
    let stored = deps.search_results.find_search_result(result_id).await.unwrap().unwrap();
    assert!(stored.is_processed);

    let filter = SupplierFilter::for_query(&component, "Germany");
    assert_eq!(deps.suppliers.find_suppliers(&filter).await.unwrap().len(), 3);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn queued_task_runs_through_the_postgres_queue(ctx: &TestHarness) {
    let component = "bearings".to_string();
    let deps = Arc::new(server_deps(
        ctx,
        MockAI::new()
            .with_error(ErrorClass::Server, "overloaded")
            .with_response(search_response(BEARINGS_RESEARCH))
            .with_response(bearing_extraction()),
    ));

    let task = enqueue_supplier_task(&component, "Germany", &deps).await.unwrap();

    // Same task id means the same idempotency key
    let duplicate = deps
        .job_queue
        .enqueue(&SupplierSearchJob {
            task_id: task.id,
            component: component.clone(),
            country: "Germany".into(),
        })
        .await
        .unwrap();
    assert!(!duplicate.is_created());

    let runner = JobRunner::new(deps.job_queue.clone(), Arc::new(build_job_registry()), deps.clone());
    assert_eq!(runner.process_batch().await.unwrap(), 1);

    let job = Job::find_by_id(duplicate.job_id(), &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.attempts, 1);

    let finished = deps.tasks.find_task(task.id).await.unwrap().unwrap();
    assert_eq!(finished.status, TaskStatus::Completed);
    assert_eq!(finished.supplier_count, Some(3));

    let results = task_results(task.id, &deps).await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.search_result_id == finished.search_result_id));

    assert!(deps.job_queue.claim("idle-worker", 10).await.unwrap().is_empty());
}
