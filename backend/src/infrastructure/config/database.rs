//! Database configuration for the taskboard backend.
//!
//! This module defines the connection URL, startup retry bounds and schema
//! bootstrap switches.

use secrecy::SecretString;
use serde::Deserialize;

/// Database connection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    /// Database connection URL.
    pub url: SecretString,
    /// Connection attempts made at startup before giving up.
    pub max_attempts: u32,
    /// Fixed delay between startup connection attempts, in seconds.
    pub retry_delay_secs: u64,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// Create secondary indexes at startup.
    pub bootstrap: bool,
    /// Insert sample tasks when bootstrapping an empty table.
    pub seed_sample_data: bool,
}
