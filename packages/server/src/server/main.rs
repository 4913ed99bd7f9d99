// API server: HTTP routes plus, unless disabled, the embedded job runner

use anyhow::{Context, Result};
use procurement_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,procurement_core=debug,sqlx=warn,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // Missing credentials stop the process here, before anything listens
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        search_model = %config.search.model,
        extraction_model = %config.extraction.model,
        embedded_worker = config.run_embedded_worker,
        "configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("database ready");

    let app = build_app(pool, &config)?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!(%addr, "procurement research API listening");

    axum::serve(listener, app.router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("Server error")?;

    // A job cut off mid-run would leave its task processing
    if let Some(runner) = app.job_runner {
        tracing::info!("waiting for the job runner to finish its current job");
        runner.stop().await;
    }

    Ok(())
}
