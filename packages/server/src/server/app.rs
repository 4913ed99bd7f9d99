//! Application setup and server configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anthropic_client::AnthropicClient;
use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::jobs::{build_job_registry, JobQueue, JobRunner, JobRunnerConfig, PostgresJobQueue};
use crate::kernel::{PostgresStore, ServerDeps};
use crate::server::routes::{
    create_task_handler, extract_handler, health_handler, query_handler, results_handler,
    search_result_handler, task_handler, task_results_handler,
};

/// Web search with a large thinking budget can run for minutes.
const MODEL_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    /// Only used by the health check; absent when wired in memory
    pub db_pool: Option<PgPool>,
    pub server_deps: Arc<ServerDeps>,
}

/// Wire the production dependencies: Anthropic client, Postgres store and queue.
///
/// Fails when the model client cannot be built.
pub fn build_server_deps(pool: &PgPool, config: &Config) -> Result<ServerDeps> {
    let mut client = AnthropicClient::new(config.anthropic_api_key.clone())
        .with_timeout(MODEL_REQUEST_TIMEOUT)
        .context("Failed to build Anthropic client")?;
    if let Some(base_url) = &config.anthropic_base_url {
        client = client.with_base_url(base_url.clone());
    }

    let job_queue: Arc<dyn JobQueue> = Arc::new(PostgresJobQueue::new(pool.clone()));

    Ok(ServerDeps::new(
        Arc::new(client),
        Arc::new(PostgresStore::new(pool.clone())),
        job_queue,
        config.pipeline(),
    ))
}

/// A job runner running alongside the HTTP server.
pub struct EmbeddedJobRunner {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl EmbeddedJobRunner {
    /// Ask the runner to stop and wait for the job it is running to finish.
    pub async fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Job runner task panicked");
        }
    }
}

/// Spawn a job runner on the current runtime.
pub fn spawn_job_runner(deps: Arc<ServerDeps>, poll_interval: Duration) -> EmbeddedJobRunner {
    let runner = JobRunner::with_config(
        deps.job_queue.clone(),
        Arc::new(build_job_registry()),
        deps,
        JobRunnerConfig {
            poll_interval,
            ..JobRunnerConfig::default()
        },
    );
    let shutdown = runner.shutdown_handle();
    let handle = tokio::spawn(async move {
        if let Err(e) = runner.run().await {
            tracing::error!(error = %e, "Job runner exited with error");
        }
    });

    EmbeddedJobRunner { shutdown, handle }
}

/// Build the Axum router around already-wired state.
pub fn build_router(state: AxumAppState) -> Router {
    // CORS configuration - allow any origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/discovery/query", post(query_handler))
        .route("/discovery/results", get(results_handler))
        .route("/discovery/search-results/:id", get(search_result_handler))
        .route("/discovery/search-results/:id/extract", post(extract_handler))
        .route("/discovery/tasks", post(create_task_handler))
        .route("/discovery/tasks/:id", get(task_handler))
        .route("/discovery/tasks/:id/results", get(task_results_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Everything `main` needs to serve and shut down.
pub struct ServerApp {
    pub router: Router,
    pub server_deps: Arc<ServerDeps>,
    /// Absent when the config turns the embedded runner off
    pub job_runner: Option<EmbeddedJobRunner>,
}

/// Build the Axum application router
///
/// Also starts the embedded job runner unless the config turns it off.
pub fn build_app(pool: PgPool, config: &Config) -> Result<ServerApp> {
    let server_deps = Arc::new(build_server_deps(&pool, config)?);

    let job_runner = if config.run_embedded_worker {
        Some(spawn_job_runner(server_deps.clone(), config.worker_poll_interval))
    } else {
        tracing::info!("Embedded job runner disabled, run the worker binary");
        None
    };

    let router = build_router(AxumAppState {
        db_pool: Some(pool),
        server_deps: server_deps.clone(),
    });

    Ok(ServerApp {
        router,
        server_deps,
        job_runner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::discovery::{enqueue_supplier_task, get_task, TaskStatus};
    use crate::kernel::test_dependencies::{search_response, supplier_tool_response, MockAI, TestDependencies};
    use serde_json::json;

    #[tokio::test]
    async fn embedded_runner_finishes_queued_task_then_stops() {
        let test_deps = TestDependencies::new().mock_ai(
            MockAI::new()
                .with_response(search_response("research"))
                .with_response(supplier_tool_response(vec![json!({"name": "Acme"})])),
        );
        let deps = Arc::new(test_deps.server_deps());
        let task = enqueue_supplier_task("bearings", "Germany", &deps).await.unwrap();

        let runner = spawn_job_runner(deps.clone(), Duration::from_millis(5));
        let finished = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let current = get_task(task.id, &deps).await.unwrap();
                if current.status.is_terminal() {
                    break current;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        tokio::time::timeout(Duration::from_secs(5), runner.stop())
            .await
            .unwrap();
        assert_eq!(finished.status, TaskStatus::Completed);
    }
}
