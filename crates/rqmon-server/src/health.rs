use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use rqmon_common::types::Category;
use serde_json::json;
use std::time::Duration;

const READINESS_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
}

/// Liveness: always 200 while the process runs.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.config.load_full();
    let active_alerts = state
        .tracker
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .active_count();

    Json(json!({
        "status": "ok",
        "uptime_secs": (Utc::now() - state.started_at).num_seconds(),
        "target": state.target,
        "collection_interval_secs": state.collection_interval_secs,
        "queues": {
            "monitored": config.queue_count(),
            "core": config.count_by_category(Category::Core),
            "support": config.count_by_category(Category::Support),
        },
        "active_alerts": active_alerts,
    }))
}

/// Readiness: probes the management API with a short timeout.
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let probe = tokio::time::timeout(
        READINESS_PROBE_TIMEOUT,
        state.provider.check_connectivity(),
    )
    .await;

    match probe {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Ok(Err(e)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready", "error": e.to_string() })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready", "error": "connectivity probe timed out" })),
        ),
    }
}
