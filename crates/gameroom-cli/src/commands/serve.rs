//! Start the GameRoom relay server.

use clap::Args;

use gameroom_core::error::AppError;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, config_dir: &str, env: &str) -> Result<(), AppError> {
    let mut config = super::load_config(config_dir, env)?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }

    gameroom_api::init_logging(&config.logging);

    println!("Starting GameRoom relay...");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);

    gameroom_api::run_server(config).await
}
