//! # gameroom-api
//!
//! HTTP layer for GameRoom built on Axum.
//!
//! Exposes the WebSocket upgrade routes for hosts and players, the session
//! close route, health endpoints, middleware (CORS, request logging),
//! error mapping, and logging setup.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod telemetry;

pub use app::{build_app, run_server, serve, shutdown_signal};
pub use error::ApiError;
pub use state::AppState;
pub use telemetry::init_logging;
