//! Health check endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum::extract::State;
use serde_json::json;

use crate::AppState;

/// GET /api/translate/health
///
/// Reports gateway liveness together with broker reachability; a dead
/// broker means submissions cannot be accepted, so it fails the check.
pub async fn health_check(State(state): State<AppState>) -> Response {
    match state.broker.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "OK", "redis_health_check": "connected"})),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "Health check failed to reach broker");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "error", "redis_health_check": "disconnected"})),
            )
                .into_response()
        }
    }
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/api/translate/health", get(health_check))
}
