//! CLI command definitions and dispatch.

pub mod close;
pub mod serve;
pub mod status;

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use gameroom_core::config::AppConfig;
use gameroom_core::error::AppError;

/// Default relay address used by the remote commands.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8080";

/// GameRoom: WebSocket relay for multiplayer game sessions
#[derive(Debug, Parser)]
#[command(name = "gameroom", version, about, long_about = None)]
pub struct Cli {
    /// Configuration directory
    #[arg(short, long, default_value = "config", env = "GAMEROOM_CONFIG")]
    pub config: String,

    /// Configuration environment overlay
    #[arg(short, long, default_value = "development", env = "GAMEROOM_ENV")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the relay server
    Serve(serve::ServeArgs),
    /// Close a game session on a running relay
    Close(close::CloseArgs),
    /// Show the status of a running relay
    Status(status::StatusArgs),
}

impl Cli {
    /// Whether the selected command runs the server.
    pub fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve(_))
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, &self.config, &self.env).await,
            Commands::Close(args) => close::execute(args).await,
            Commands::Status(args) => status::execute(args, self.format).await,
        }
    }
}

/// Helper: load configuration from the config directory
pub fn load_config(config_dir: &str, env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_dir, env)
}

/// Helper: HTTP client for talking to a running relay
pub fn http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(concat!("gameroom-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))
}

/// Helper: join a base URL and a path without doubling slashes
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
