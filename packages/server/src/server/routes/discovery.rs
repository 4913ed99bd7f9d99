// Discovery endpoints - a thin layer over the discovery domain actions

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domains::discovery::{self, RawSearchResult, SupplierTask};
use crate::domains::suppliers::models::{SupplierFilter, SupplierRecord};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SupplierQueryRequest {
    pub component: String,
    pub country: String,
    #[serde(default)]
    pub evaluate: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub evaluate: bool,
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub component: String,
    pub country: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    pub component: Option<String>,
    pub country: Option<String>,
    pub limit: Option<i64>,
}

/// POST /discovery/query
pub async fn query_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<SupplierQueryRequest>,
) -> Result<Json<Vec<SupplierRecord>>, ApiError> {
    let records = discovery::query_suppliers(
        &request.component,
        &request.country,
        request.evaluate,
        &state.server_deps,
    )
    .await?;
    Ok(Json(records))
}

/// GET /discovery/results
pub async fn results_handler(
    Extension(state): Extension<AxumAppState>,
    Query(params): Query<ResultsQuery>,
) -> Result<Json<Vec<SupplierRecord>>, ApiError> {
    let filter = SupplierFilter {
        component_type: params.component.filter(|c| !c.trim().is_empty()),
        country: params.country.filter(|c| !c.trim().is_empty()),
        search_result_id: None,
    };
    let records = discovery::list_suppliers(&filter, params.limit, &state.server_deps).await?;
    Ok(Json(records))
}

/// GET /discovery/search-results/:id
pub async fn search_result_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RawSearchResult>, ApiError> {
    Ok(Json(discovery::get_search_result(id, &state.server_deps).await?))
}

/// POST /discovery/search-results/:id/extract
pub async fn extract_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<ExtractRequest>>,
) -> Result<Json<Vec<SupplierRecord>>, ApiError> {
    let evaluate = request.map(|Json(r)| r.evaluate).unwrap_or(false);
    let records = discovery::extract_search_result(id, evaluate, &state.server_deps).await?;
    Ok(Json(records))
}

/// POST /discovery/tasks
pub async fn create_task_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<TaskRequest>,
) -> Result<(StatusCode, Json<SupplierTask>), ApiError> {
    let task =
        discovery::enqueue_supplier_task(&request.component, &request.country, &state.server_deps)
            .await?;
    Ok((StatusCode::ACCEPTED, Json(task)))
}

/// GET /discovery/tasks/:id
pub async fn task_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SupplierTask>, ApiError> {
    Ok(Json(discovery::get_task(id, &state.server_deps).await?))
}

/// GET /discovery/tasks/:id/results
pub async fn task_results_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SupplierRecord>>, ApiError> {
    Ok(Json(discovery::task_results(id, &state.server_deps).await?))
}
