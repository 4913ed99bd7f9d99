//! Standalone job worker
//!
//! Runs queued supplier tasks without serving HTTP. Use it with
//! RUN_EMBEDDED_WORKER=false on the API server.

use std::sync::Arc;

use anyhow::{Context, Result};
use procurement_core::kernel::jobs::{build_job_registry, JobRunner, JobRunnerConfig};
use procurement_core::server::build_server_deps;
use procurement_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,procurement_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let deps = Arc::new(build_server_deps(&pool, &config)?);
    let registry = Arc::new(build_job_registry());
    tracing::info!(job_types = ?registry.registered_types(), "Starting job worker");

    let runner = JobRunner::with_config(
        deps.job_queue.clone(),
        registry,
        deps,
        JobRunnerConfig {
            poll_interval: config.worker_poll_interval,
            ..JobRunnerConfig::with_worker_id(format!("worker-{}", std::process::id()))
        },
    );

    runner.run_until_shutdown().await
}
