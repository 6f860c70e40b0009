//! Notification queue endpoints.
//!
//! `GET /queue` returns a snapshot without draining. `POST /queue` accepts
//! `{ "recipient", "subject", "body" }`; blank or missing fields yield 400
//! and nothing is queued.

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use tickwork_scheduler::{QueueOverview, SubmitReceipt};

use super::{api_error, ApiResult};
use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    // Missing fields fall through to core validation so the client gets a
    // field-level error instead of a deserialisation failure.
    #[serde(default, alias = "to")]
    pub recipient: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// GET /queue: pending notifications, oldest first.
pub async fn queue_handler(State(state): State<Arc<AppState>>) -> Json<QueueOverview> {
    Json(state.state.queue_overview())
}

/// POST /queue: validate and enqueue a notification.
pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<Json<SubmitReceipt>> {
    let receipt = state
        .state
        .submit_notification(&req.recipient, &req.subject, &req.body)
        .map_err(api_error)?;
    Ok(Json(receipt))
}
