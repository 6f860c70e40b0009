use axum::{extract::State, Json};
use std::sync::Arc;
use tickwork_scheduler::JobRecord;

use crate::app::AppState;

/// GET /jobs: runtime record of every registered job, in registration order.
pub async fn jobs_handler(State(state): State<Arc<AppState>>) -> Json<Vec<JobRecord>> {
    Json(state.jobs.all())
}
