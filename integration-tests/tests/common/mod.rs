//! Shared test utilities for integration tests.
//!
//! Starts a real supervisor on an ephemeral loopback port and talks to it
//! over HTTP.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Result, bail};
use taskboard_backend::infrastructure::config::Settings;
use taskboard_backend::supervisor::{Phase, Supervisor, SupervisorError};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// A supervised backend running in the test process.
pub struct RunningBackend {
    /// Bound listener address.
    pub addr: SocketAddr,
    /// Base URL, e.g. `http://127.0.0.1:40123`.
    pub base_url: String,
    /// HTTP client shared by the test.
    pub client: reqwest::Client,
    phases: watch::Receiver<Phase>,
    stop: Option<oneshot::Sender<()>>,
    run: JoinHandle<Result<(), SupervisorError>>,
}

impl RunningBackend {
    /// Starts a backend against `database_url` and waits until it serves.
    pub async fn start(database_url: &str) -> Result<Self> {
        Self::start_with(database_url, &[]).await
    }

    /// Like [`RunningBackend::start`], with extra variables that override
    /// the test defaults.
    pub async fn start_with(database_url: &str, extra: &[(&str, &str)]) -> Result<Self> {
        let mut vars = vec![
            ("DATABASE_URL".to_string(), database_url.to_string()),
            ("PORT".to_string(), "0".to_string()),
            ("APP_ENV".to_string(), "integration".to_string()),
            ("TASKBOARD_SERVER__HOST".to_string(), "127.0.0.1".to_string()),
            ("TASKBOARD_DATABASE__RETRY_DELAY_SECS".to_string(), "0".to_string()),
            ("TASKBOARD_DATABASE__MAX_ATTEMPTS".to_string(), "1".to_string()),
        ];
        vars.extend(extra.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
        let settings = Settings::from_vars(vars)?;

        let supervisor = Supervisor::new(settings);
        let mut phases = supervisor.phases();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let run = tokio::spawn(supervisor.run(async move {
            let _ = stop_rx.await;
        }));

        let phase = *phases
            .wait_for(|p| matches!(p, Phase::Serving { .. } | Phase::Failed))
            .await?;
        let Phase::Serving { addr } = phase else {
            bail!("backend failed to start: {phase:?}");
        };

        Ok(Self {
            addr,
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            phases,
            stop: Some(stop_tx),
            run,
        })
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        *self.phases.borrow()
    }

    /// Fires the shutdown future without waiting for the run to end.
    pub fn request_shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    /// Waits up to `timeout` for a phase matching `pred`.
    pub async fn wait_for_phase(
        &mut self,
        timeout: Duration,
        pred: impl FnMut(&Phase) -> bool,
    ) -> Result<Phase> {
        let phase = tokio::time::timeout(timeout, self.phases.wait_for(pred)).await??;
        Ok(*phase)
    }

    /// Requests shutdown and waits for the run to finish.
    pub async fn shutdown(mut self) -> Result<Phase> {
        self.request_shutdown();
        (&mut self.run).await??;
        Ok(self.phase())
    }
}
