//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: status(&state).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health/detailed
pub async fn detailed_health(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let snapshot = state.relay.snapshot();

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status(&state).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        sessions: snapshot.sessions,
        connections: snapshot.connections,
        metrics: snapshot.metrics,
    }))
}

fn status(state: &AppState) -> &'static str {
    if state.relay.is_shutting_down() {
        "shutting_down"
    } else {
        "ok"
    }
}
