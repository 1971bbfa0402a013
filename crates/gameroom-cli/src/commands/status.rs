//! Show the status of a running relay.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use gameroom_api::dto::response::{ApiResponse, DetailedHealthResponse};
use gameroom_core::error::AppError;

/// Arguments for the status command
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Relay base URL
    #[arg(long, default_value = super::DEFAULT_URL)]
    pub url: String,
}

/// Status display row
#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    /// Metric
    metric: String,
    /// Value
    value: String,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, format: OutputFormat) -> Result<(), AppError> {
    let response = super::http_client()?
        .get(super::endpoint(&args.url, "/api/health/detailed"))
        .send()
        .await
        .map_err(|e| AppError::external_service(format!("Request failed: {}", e)))?
        .error_for_status()
        .map_err(|e| AppError::external_service(format!("Relay error: {}", e)))?;

    let health: ApiResponse<DetailedHealthResponse> = response
        .json()
        .await
        .map_err(|e| AppError::external_service(format!("Invalid status response: {}", e)))?;

    match format {
        OutputFormat::Json => output::print_item(&health.data, format),
        OutputFormat::Table => output::print_list(&rows(&health.data), format),
    }

    Ok(())
}

fn rows(health: &DetailedHealthResponse) -> Vec<StatusRow> {
    let m = &health.metrics;
    [
        ("status", health.status.clone()),
        ("version", health.version.clone()),
        ("uptime_seconds", health.uptime_seconds.to_string()),
        ("sessions", health.sessions.to_string()),
        ("connections", health.connections.to_string()),
        ("connections_total", m.connections_total.to_string()),
        ("messages_received", m.messages_received.to_string()),
        ("messages_relayed", m.messages_relayed.to_string()),
        ("send_failures", m.send_failures.to_string()),
        ("sessions_closed", m.sessions_closed.to_string()),
        ("sessions_swept", m.sessions_swept.to_string()),
    ]
    .into_iter()
    .map(|(metric, value)| StatusRow {
        metric: metric.to_string(),
        value,
    })
    .collect()
}
