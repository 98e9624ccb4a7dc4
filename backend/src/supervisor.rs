//! Process lifecycle.
//!
//! [`Supervisor::run`] enforces the startup order: the database connection
//! must exist before the listener is bound, so no request is ever served
//! without a store behind it. The phases are
//!
//! ```text
//! Starting -> Connecting -> Serving -> Draining -> Stopped
//!                  |  \
//!                  |   -> Failed
//!                   -> Stopped   (shutdown before connecting)
//! ```
//!
//! and the current one is published on a watch channel. On shutdown the
//! listener stops accepting, in-flight requests get up to
//! `server.drain_timeout_secs` to finish, and only then is the connection
//! closed. A drain timeout of zero closes the connection immediately.
//! A shutdown requested while still connecting abandons the retries and
//! ends the run cleanly without ever binding the listener.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tracing::{error, info, warn};

use crate::api::AppState;
use crate::connection::{ConnectionError, ConnectionManager};
use crate::infrastructure::audit::{self, AuditEvent};
use crate::infrastructure::config::{BindAddress, Settings};
use crate::infrastructure::server;
use crate::store::{self, SqliteTaskStore, StoreError};

/// Lifecycle phase of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Configuration loaded, components not yet wired.
    Starting,
    /// Establishing the database connection.
    Connecting,
    /// Listener bound and handling requests.
    Serving {
        /// Address the listener is bound to.
        addr: SocketAddr,
    },
    /// Shutdown requested; finishing in-flight requests.
    Draining,
    /// Run finished cleanly and any connection is closed.
    Stopped,
    /// Startup aborted; no traffic was served.
    Failed,
}

/// Errors that end a supervised run.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The database could not be reached at startup.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// Schema preparation failed.
    #[error("Schema preparation failed: {0}")]
    Schema(#[from] StoreError),
    /// The listen address is invalid or could not be bound.
    #[error("Failed to bind listener: {0}")]
    Bind(String),
    /// The HTTP server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Drives the process through its lifecycle phases.
#[derive(Debug)]
pub struct Supervisor {
    settings: Settings,
    phase: watch::Sender<Phase>,
    started_at: Instant,
}

impl Supervisor {
    /// Creates a supervisor in the `Starting` phase. Reported uptime is
    /// measured from this call, so it includes time spent connecting.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let (phase, _) = watch::channel(Phase::Starting);
        Self {
            settings,
            phase,
            started_at: Instant::now(),
        }
    }

    /// Subscribes to phase changes.
    #[must_use]
    pub fn phases(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    fn enter(&self, next: Phase) {
        info!(phase = ?next, "Supervisor phase change");
        self.phase.send_replace(next);
    }

    /// Connects, serves until `shutdown` resolves, then drains and closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established, the schema
    /// cannot be prepared, the listener cannot be bound, or the server fails.
    /// The phase is `Failed` in every error case.
    pub async fn run<F>(self, shutdown: F) -> Result<(), SupervisorError>
    where
        F: Future<Output = ()> + Send,
    {
        let result = self.run_phases(shutdown).await;
        if let Err(ref e) = result {
            error!(error = %e, "Supervisor run failed");
            self.enter(Phase::Failed);
        }
        result
    }

    async fn run_phases<F>(&self, shutdown: F) -> Result<(), SupervisorError>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        let metrics = server::install_metrics_recorder();

        self.enter(Phase::Connecting);
        let connection = tokio::select! {
            connected = ConnectionManager::connect(&self.settings.database) => Arc::new(connected?),
            () = &mut shutdown => {
                info!("Shutdown requested before the database connection was established");
                audit::log_audit(&AuditEvent::ServiceStopped {
                    reason: "Shutdown signal received while connecting".to_string(),
                });
                self.enter(Phase::Stopped);
                return Ok(());
            }
        };

        let store = SqliteTaskStore::new(connection.pool().clone());
        if let Err(e) = self.prepare_schema(&store).await {
            connection.close().await;
            return Err(e);
        }

        let state = Arc::new(
            AppState::new(
                Arc::new(store),
                Arc::clone(&connection),
                self.settings.environment.clone(),
            )
            .with_started_at(self.started_at),
        );
        let app = server::build_router(state, &self.settings.server, metrics);

        let listener = match self.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                connection.close().await;
                return Err(e);
            }
        };
        let addr = listener.local_addr()?;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .into_future(),
        );

        self.enter(Phase::Serving { addr });
        info!(
            %addr,
            environment = %self.settings.environment,
            "Server running; health check at /health, API at /api/v1/tasks"
        );
        audit::log_audit(&AuditEvent::ServiceStarted {
            environment: self.settings.environment.clone(),
            address: addr.to_string(),
        });

        let served = tokio::select! {
            joined = &mut server => {
                Some(flatten(joined))
            }
            () = &mut shutdown => None,
        };

        self.enter(Phase::Draining);
        let outcome = match served {
            Some(result) => {
                warn!("Server stopped before a shutdown signal");
                result
            }
            None => {
                let _ = stop_tx.send(());
                self.drain(server).await
            }
        };

        connection.close().await;
        audit::log_audit(&AuditEvent::ServiceStopped {
            reason: match outcome {
                Ok(()) => "Shutdown signal received".to_string(),
                Err(ref e) => e.to_string(),
            },
        });
        outcome?;

        self.enter(Phase::Stopped);
        Ok(())
    }

    async fn prepare_schema(&self, store: &SqliteTaskStore) -> Result<(), SupervisorError> {
        store.ensure_schema().await?;
        if self.settings.database.bootstrap {
            store::bootstrap(store, self.settings.database.seed_sample_data).await?;
        }
        Ok(())
    }

    async fn bind(&self) -> Result<TcpListener, SupervisorError> {
        let addr = BindAddress::from(&self.settings.server)
            .to_socket_addr()
            .map_err(|e| SupervisorError::Bind(e.to_string()))?;
        TcpListener::bind(addr)
            .await
            .map_err(|e| SupervisorError::Bind(format!("{addr}: {e}")))
    }

    async fn drain(
        &self,
        server: tokio::task::JoinHandle<std::io::Result<()>>,
    ) -> Result<(), std::io::Error> {
        let timeout = Duration::from_secs(self.settings.server.drain_timeout_secs);
        if timeout.is_zero() {
            server.abort();
            info!("Closing without waiting for in-flight requests");
            return Ok(());
        }

        let abort = server.abort_handle();
        match tokio::time::timeout(timeout, server).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "In-flight requests did not finish before the drain timeout"
                );
                abort.abort();
                Ok(())
            }
        }
    }
}

fn flatten(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), std::io::Error> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(std::io::Error::other(e)),
    }
}

/// Installs SIGINT and, on Unix, SIGTERM handlers immediately and returns
/// a future that resolves when either arrives.
///
/// Handlers are registered before the future is first polled, so a signal
/// delivered while the supervisor is still connecting is not lost. If a
/// handler cannot be installed the error is logged and that signal is
/// ignored rather than triggering an immediate shutdown.
pub fn shutdown_signal() -> impl Future<Output = ()> + Send {
    #[cfg(unix)]
    let signals = (
        listen(tokio::signal::unix::SignalKind::interrupt(), "SIGINT"),
        listen(tokio::signal::unix::SignalKind::terminate(), "SIGTERM"),
    );

    async move {
        #[cfg(unix)]
        {
            let (interrupt, terminate) = signals;
            tokio::select! {
                () = recv(interrupt) => info!("SIGINT received, shutting down"),
                () = recv(terminate) => info!("SIGTERM received, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
            info!("Ctrl+C received, shutting down");
        }
    }
}

#[cfg(unix)]
fn listen(
    kind: tokio::signal::unix::SignalKind,
    name: &str,
) -> Option<tokio::signal::unix::Signal> {
    match tokio::signal::unix::signal(kind) {
        Ok(signal) => Some(signal),
        Err(e) => {
            error!("Failed to install {name} handler: {e}");
            None
        }
    }
}

#[cfg(unix)]
async fn recv(signal: Option<tokio::signal::unix::Signal>) {
    match signal {
        Some(mut signal) => {
            signal.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}
