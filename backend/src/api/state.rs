//! Shared request state.

use std::sync::Arc;
use std::time::Instant;

use crate::connection::ConnectionManager;
use crate::store::TaskStore;

/// State handed to every handler.
///
/// The connection manager is passed explicitly instead of living in a
/// global, so the readiness probe and the store observe the same pool.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn TaskStore>,
    connection: Arc<ConnectionManager>,
    environment: String,
    started_at: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("environment", &self.environment)
            .field("connected", &self.connection.is_connected())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates the state. Uptime is measured from this call unless
    /// [`AppState::with_started_at`] supplies an earlier start.
    #[must_use]
    pub fn new(
        store: Arc<dyn TaskStore>,
        connection: Arc<ConnectionManager>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            store,
            connection,
            environment: environment.into(),
            started_at: Instant::now(),
        }
    }

    /// Measures uptime from `started_at` instead, typically the moment the
    /// process began starting up rather than when the store became usable.
    #[must_use]
    pub fn with_started_at(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    /// Task store.
    #[must_use]
    pub fn store(&self) -> &dyn TaskStore {
        self.store.as_ref()
    }

    /// Connection manager backing the store.
    #[must_use]
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Deployment environment label.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Time since the state was created.
    #[must_use]
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::RetryPolicy;
    use crate::store::SqliteTaskStore;
    use anyhow::Result;
    use std::time::Duration;

    #[tokio::test]
    async fn uptime_counts_from_supplied_start() -> Result<()> {
        let connection = Arc::new(
            ConnectionManager::connect_with("sqlite::memory:", RetryPolicy::default(), 1).await?,
        );
        let store = Arc::new(SqliteTaskStore::new(connection.pool().clone()));
        let started_at = Instant::now() - Duration::from_secs(30);

        let state = AppState::new(store, connection, "test").with_started_at(started_at);

        assert!(state.uptime() >= Duration::from_secs(30));
        Ok(())
    }
}
