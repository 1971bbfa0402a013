//! GameRoom relay server.
//!
//! Loads configuration, initializes logging, and serves the relay until
//! Ctrl+C or SIGTERM.

use gameroom_core::config::AppConfig;
use gameroom_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    gameroom_api::init_logging(&config.logging);

    if let Err(e) = gameroom_api::run_server(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from the config directory and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_dir = std::env::var("GAMEROOM_CONFIG").unwrap_or_else(|_| "config".to_string());
    let env = std::env::var("GAMEROOM_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_dir, &env)
}
