//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use gameroom_core::config::AppConfig;
use gameroom_realtime::server::RelayEngine;

/// Shared application state passed to every Axum handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Session relay engine.
    pub relay: Arc<RelayEngine>,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Builds the state and its relay engine from configuration.
    pub fn new(config: AppConfig) -> Self {
        let relay = Arc::new(RelayEngine::new(config.realtime.clone()));
        Self {
            config: Arc::new(config),
            relay,
            started_at: Instant::now(),
        }
    }
}
