pub mod health;
pub mod jobs;
pub mod metrics;
pub mod queue;

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tickwork_scheduler::SchedulerError;

#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: &'static str,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Map a core error onto an HTTP status and JSON body.
pub fn api_error(err: SchedulerError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        SchedulerError::Validation { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiError {
            code: err.code(),
            error: err.to_string(),
        }),
    )
}
