//! Database connection supervision.
//!
//! [`ConnectionManager`] owns the single pool the task store uses. It is built
//! by [`ConnectionManager::connect`], which retries with a fixed bound, and it
//! is the only component allowed to close that pool. Readiness is read through
//! [`ConnectionManager::is_connected`] without awaiting anything.

pub mod retry;

pub use retry::{BoundedRetry, RetryDecision, RetryExhausted, RetryPolicy};

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::infrastructure::audit::{self, AuditEvent};
use crate::infrastructure::config::DatabaseSettings;

/// Errors raised while establishing the database connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The configured URL could not be parsed into connection options.
    #[error("Invalid database URL: {0}")]
    InvalidUrl(#[source] sqlx::Error),
    /// Every attempt allowed by the retry policy failed.
    #[error("Could not connect to the database after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error reported by the final attempt.
        #[source]
        last_error: sqlx::Error,
    },
}

/// Owner of the live database pool.
#[derive(Debug)]
pub struct ConnectionManager {
    pool: SqlitePool,
    host: String,
    closed: AtomicBool,
}

impl ConnectionManager {
    /// Connects using the database section of the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Exhausted`] when no attempt succeeds, or
    /// [`ConnectionError::InvalidUrl`] when the URL is malformed.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, ConnectionError> {
        let policy = RetryPolicy::new(
            settings.max_attempts,
            Duration::from_secs(settings.retry_delay_secs),
        );
        Self::connect_with(settings.url.expose_secret(), policy, settings.max_connections).await
    }

    /// Connects to `url`, retrying according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Exhausted`] when no attempt succeeds, or
    /// [`ConnectionError::InvalidUrl`] when the URL is malformed.
    #[instrument(skip(url), fields(max_attempts = policy.max_attempts()))]
    pub async fn connect_with(
        url: &str,
        policy: RetryPolicy,
        max_connections: u32,
    ) -> Result<Self, ConnectionError> {
        let options = SqliteConnectOptions::from_str(url).map_err(ConnectionError::InvalidUrl)?;
        let host = options.get_filename().display().to_string();
        let pool_options = pool_options_for(url, max_connections);

        let connected = retry::run(policy, |attempt| {
            metrics::counter!("taskboard_db_connect_attempts_total").increment(1);
            info!(attempt, "Connecting to database");
            pool_options.clone().connect_with(options.clone())
        })
        .await;

        match connected {
            Ok(pool) => {
                info!(host = %host, "Database connected");
                audit::log_audit(&AuditEvent::DatabaseConnected { host: host.clone() });
                Ok(Self {
                    pool,
                    host,
                    closed: AtomicBool::new(false),
                })
            }
            Err(RetryExhausted {
                attempts,
                last_error,
            }) => {
                error!(attempts, "Could not connect to database after multiple attempts");
                audit::log_audit(&AuditEvent::DatabaseUnavailable { attempts });
                Err(ConnectionError::Exhausted {
                    attempts,
                    last_error,
                })
            }
        }
    }

    /// True while the pool is open and has not been closed through
    /// [`ConnectionManager::close`].
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && !self.pool.is_closed()
    }

    /// Backend host resolved at connect time. For `SQLite` this is the
    /// database file.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Shared pool handle for the store.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool. Calling it again is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.pool.close().await;
        info!(host = %self.host, "Database connection closed");
    }
}

/// An in-memory `SQLite` database lives only as long as its connection, so
/// such pools are pinned to one connection that is never recycled.
fn pool_options_for(url: &str, max_connections: u32) -> SqlitePoolOptions {
    if url.contains(":memory:") || url.contains("mode=memory") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    }
}
