//! Application builder and server runner.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use gameroom_core::config::AppConfig;
use gameroom_core::AppResult;
use gameroom_core::error::{AppError, ErrorKind};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    info!("Starting GameRoom relay v{}", env!("CARGO_PKG_VERSION"));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Io, format!("Failed to bind {addr}"), e)
    })?;

    info!(address = %addr, "GameRoom relay listening");

    serve(listener, AppState::new(config), shutdown_signal()).await
}

/// Serves the relay on `listener` until `shutdown` resolves.
///
/// On shutdown every session is closed with a going-away notice, then the
/// server gets `shutdown_grace_seconds` to drain before it is dropped.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let relay = state.relay.clone();
    let grace = Duration::from_secs(state.config.server.shutdown_grace_seconds);
    let sweeper = relay.spawn_sweeper();

    let stopping = CancellationToken::new();
    let trigger = stopping.clone();
    let shutdown_relay = relay.clone();

    let server = axum::serve(listener, build_app(state)).with_graceful_shutdown(async move {
        shutdown.await;
        info!("Shutdown signal received, starting graceful shutdown...");
        shutdown_relay.shutdown();
        trigger.cancel();
    });

    let result = tokio::select! {
        result = server.into_future() => {
            result.map_err(|e| AppError::with_source(ErrorKind::Io, "Server error", e))
        }
        _ = async {
            stopping.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out");
            Ok(())
        }
    };

    if !relay.is_shutting_down() {
        relay.shutdown();
    }
    if let Some(task) = sweeper {
        let _ = task.await;
    }

    info!("GameRoom relay shut down");
    result
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
