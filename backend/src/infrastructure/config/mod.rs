//! Configuration management for the taskboard backend.
//!
//! Settings are layered: built-in defaults, then `TASKBOARD_*` variables
//! (nested keys separated by `__`, e.g. `TASKBOARD_DATABASE__MAX_ATTEMPTS`),
//! then the conventional container variables `PORT`, `DATABASE_URL`,
//! `CORS_ORIGIN` and `APP_ENV`, which win over everything else.
//!
//! # Example
//!
//! ```no_run
//! use taskboard_backend::infrastructure::config::Settings;
//!
//! let settings = Settings::new().expect("Failed to load configuration");
//! ```

pub mod database;
pub mod server;
pub mod telemetry;

pub use database::DatabaseSettings;
pub use server::ServerSettings;
pub use telemetry::TelemetrySettings;

use std::collections::HashMap;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Top-level configuration for the taskboard backend.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Deployment environment label reported by `/health`.
    pub environment: String,
    /// Server settings.
    pub server: ServerSettings,
    /// Database settings.
    pub database: DatabaseSettings,
    /// Telemetry settings.
    pub telemetry: TelemetrySettings,
}

/// Plain variables mapped onto nested keys.
const CONTAINER_OVERRIDES: [(&str, &str); 4] = [
    ("PORT", "server.port"),
    ("DATABASE_URL", "database.url"),
    ("CORS_ORIGIN", "server.cors_origin"),
    ("APP_ENV", "environment"),
];

impl Settings {
    /// Loads `.env` if present, then builds settings from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case in containers.
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars())
    }

    /// Builds settings from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let mut builder = Config::builder()
            // Start with default values
            .set_default("environment", "development")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.cors_origin", "*")?
            .set_default("server.drain_timeout_secs", 10)?
            .set_default("database.url", "sqlite://taskboard.db?mode=rwc")?
            .set_default("database.max_attempts", 5)?
            .set_default("database.retry_delay_secs", 5)?
            .set_default("database.max_connections", 5)?
            .set_default("database.bootstrap", false)?
            .set_default("database.seed_sample_data", false)?
            .set_default("telemetry.service_name", "taskboard-backend")?
            .set_default("telemetry.sampling_ratio", 1.0)?
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.json_logs", true)?
            // Merge in Environment variables
            .add_source(
                Environment::with_prefix("TASKBOARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        for (var, key) in CONTAINER_OVERRIDES {
            builder = builder.set_override_option(key, vars.get(var).cloned())?;
        }

        builder.build()?.try_deserialize()
    }
}

/// Helper for strong typing addresses
pub struct BindAddress(pub String, pub u16);

impl BindAddress {
    /// Converts the bind address to a `SocketAddr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the IP address string cannot be parsed.
    pub fn to_socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        let ip = self
            .0
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid IP address '{}': {e}", self.0))?;
        Ok(std::net::SocketAddr::new(ip, self.1))
    }
}

impl From<&ServerSettings> for BindAddress {
    fn from(server: &ServerSettings) -> Self {
        Self(server.host.clone(), server.port)
    }
}
