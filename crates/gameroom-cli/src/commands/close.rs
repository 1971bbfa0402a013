//! Close a game session on a running relay.

use clap::Args;
use reqwest::StatusCode;

use crate::output;
use gameroom_core::error::AppError;
use gameroom_core::types::SessionId;

/// Arguments for the close command
#[derive(Debug, Args)]
pub struct CloseArgs {
    /// Session ID to close
    pub id: String,

    /// Relay base URL
    #[arg(long, default_value = super::DEFAULT_URL)]
    pub url: String,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the close command
pub async fn execute(args: &CloseArgs) -> Result<(), AppError> {
    let session_id = SessionId::parse(args.id.clone())?;

    if !args.yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Close session '{}' and disconnect every player?",
                session_id
            ))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let response = super::http_client()?
        .post(super::endpoint(&args.url, "/close"))
        .query(&[("id", session_id.as_str())])
        .send()
        .await
        .map_err(|e| AppError::external_service(format!("Request failed: {}", e)))?;

    match response.status() {
        StatusCode::OK => {
            output::print_success(&format!("Session {} closed", session_id));
            Ok(())
        }
        StatusCode::NOT_FOUND => {
            output::print_warning(&format!("Session {} not found", session_id));
            Ok(())
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::external_service(format!(
                "Relay answered {}: {}",
                status,
                body.trim()
            )))
        }
    }
}
