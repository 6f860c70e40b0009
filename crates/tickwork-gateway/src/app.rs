use std::sync::Arc;

use axum::{routing::get, Router};
use tickwork_core::config::TickworkConfig;
use tickwork_scheduler::{JobStatusBoard, SharedState};

/// Central shared state: passed as Arc<AppState> to all Axum handlers.
///
/// Handlers only read `state`, except `POST /queue` which goes through
/// `SharedState::submit_notification`.
pub struct AppState {
    pub config: TickworkConfig,
    pub state: Arc<SharedState>,
    pub jobs: Arc<JobStatusBoard>,
}

impl AppState {
    pub fn new(config: TickworkConfig, state: Arc<SharedState>, jobs: Arc<JobStatusBoard>) -> Self {
        Self {
            config,
            state,
            jobs,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/metrics", get(crate::http::metrics::metrics_handler))
        .route(
            "/metrics/export",
            get(crate::http::metrics::export_handler),
        )
        .route(
            "/queue",
            get(crate::http::queue::queue_handler).post(crate::http::queue::submit_handler),
        )
        .route("/jobs", get(crate::http::jobs::jobs_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use std::time::Duration;
    use tickwork_scheduler::{handler_fn, Cadence, JobDefinition};
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<AppState>) {
        let board = JobStatusBoard::new();
        board.register(
            &JobDefinition {
                name: "api-health-check".to_string(),
                cadence: Cadence::parse("*/15 * * * * *").unwrap(),
                handler: handler_fn(|_ctx| async { Ok(()) }),
                timeout: Duration::from_secs(10),
            },
            None,
        );
        let app = Arc::new(AppState::new(
            TickworkConfig::default(),
            Arc::new(SharedState::with_system_clock(100)),
            board,
        ));
        (build_router(Arc::clone(&app)), app)
    }

    async fn call(router: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn submit_then_read_queue() {
        let (router, app) = test_app();

        let (status, body) = call(
            router.clone(),
            post_json(
                "/queue",
                serde_json::json!({
                    "recipient": "admin@example.com",
                    "subject": "Report",
                    "body": "body"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "queued");

        let (status, body) = call(router.clone(), get("/queue")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["queue_size"], 1);
        assert_eq!(body["notifications"][0]["recipient"], "admin@example.com");
        assert!(!body["notifications"][0]["enqueued_at"]
            .as_str()
            .unwrap()
            .is_empty());

        app.state.drain_notifications();
        let (_, body) = call(router, get("/queue")).await;
        assert_eq!(body["queue_size"], 0);
        assert_eq!(body["notifications"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn submit_with_missing_field_is_rejected() {
        let (router, app) = test_app();
        let (status, body) = call(
            router,
            post_json(
                "/queue",
                serde_json::json!({ "recipient": "admin@example.com", "body": "x" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(app.state.queue_len(), 0);
    }

    #[tokio::test]
    async fn metrics_and_export_reflect_ledger() {
        let (router, app) = test_app();
        app.state.record_health("125MB", 6);

        let (status, body) = call(router.clone(), get("/metrics")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_metrics"], 1);
        assert_eq!(body["jobs_executed"], 1);
        assert_eq!(body["last_10_metrics"][0]["memory_usage"], "125MB");

        let (status, body) = call(router, get("/metrics/export")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn jobs_and_health_list_registered_jobs() {
        let (router, _) = test_app();
        let (status, body) = call(router.clone(), get("/jobs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "api-health-check");
        assert_eq!(body[0]["state"], "idle");

        let (status, body) = call(router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["jobs"], 1);
    }
}
