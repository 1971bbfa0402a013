//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every section falls back to its defaults when absent.

pub mod app;
pub mod logging;
pub mod realtime;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Prefix for environment variable overrides, e.g. `GAMEROOM__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "GAMEROOM";

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// (`default.toml` + environment overlay + environment variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Session relay settings.
    pub realtime: RealtimeConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a config directory.
    ///
    /// Merges `{dir}/default.toml`, the environment overlay `{dir}/{env}.toml`,
    /// and environment variables prefixed with `GAMEROOM__`. Missing files
    /// are skipped.
    pub fn load(dir: impl AsRef<Path>, env: &str) -> AppResult<Self> {
        let dir = dir.as_ref();
        let default_path = dir.join("default");
        let env_path = dir.join(env);

        let config = config::Config::builder()
            .add_source(config::File::from(default_path).required(false))
            .add_source(config::File::from(env_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
