//! Metrics endpoints: read-only views of the health ledger.

use axum::{extract::State, http::header, response::IntoResponse, Json};
use std::sync::Arc;
use tickwork_scheduler::MetricsOverview;

use super::{api_error, ApiResult};
use crate::app::AppState;

/// GET /metrics: ledger size, execution counter and the ten latest snapshots.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Json<MetricsOverview> {
    Json(state.state.metrics_overview())
}

/// GET /metrics/export: the whole ledger as pretty-printed JSON.
pub async fn export_handler(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let json = state.state.export_metrics().map_err(api_error)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json))
}
