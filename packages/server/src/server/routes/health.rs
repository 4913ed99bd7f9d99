use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::server::app::AxumAppState;

const DATABASE_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Skipped,
    Error,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: DatabaseHealth,
}

async fn probe_database(pool: &PgPool) -> DatabaseHealth {
    let failure = match tokio::time::timeout(DATABASE_PROBE_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(format!("Query failed: {}", e)),
        Err(_) => Some(format!("Query timeout (>{}s)", DATABASE_PROBE_TIMEOUT.as_secs())),
    };

    DatabaseHealth {
        status: if failure.is_some() { CheckStatus::Error } else { CheckStatus::Ok },
        error: failure,
    }
}

/// GET /health
///
/// 503 when the database does not answer. Without a pool the check is skipped.
pub async fn health_handler(
    Extension(state): Extension<AxumAppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.db_pool {
        Some(pool) => probe_database(pool).await,
        None => DatabaseHealth {
            status: CheckStatus::Skipped,
            error: None,
        },
    };

    if database.status == CheckStatus::Error {
        tracing::warn!(error = ?database.error, "health check failed");
        let body = HealthResponse { status: "unhealthy", database };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body));
    }

    (StatusCode::OK, Json(HealthResponse { status: "healthy", database }))
}
