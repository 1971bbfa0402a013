//! Route definitions for the GameRoom HTTP surface.
//!
//! The relay routes live at the root (`/host`, `/join`, `/close`) where game
//! clients expect them; operational endpoints are mounted under `/api`.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{any, get},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
///
/// Receives the fully-constructed `AppState` and threads it through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(health_routes());

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .merge(relay_routes())
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Session endpoints: host, join, close
fn relay_routes() -> Router<AppState> {
    Router::new()
        .route("/host", get(handlers::ws::host))
        .route("/join", get(handlers::ws::join))
        .route("/close", any(handlers::session::close_session))
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
}
