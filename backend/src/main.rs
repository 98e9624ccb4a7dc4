//! Taskboard backend binary.
//!
//! Exits with status 1 when configuration, telemetry or the supervised run
//! fails, and 0 after a signal-initiated shutdown.

use taskboard_backend::infrastructure::{config::Settings, telemetry::TelemetryBuilder};
use taskboard_backend::supervisor::{shutdown_signal, Supervisor};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    TelemetryBuilder::from_settings(&settings.telemetry, env!("CARGO_PKG_VERSION")).init()?;

    // Installed before connecting so a signal during startup retries is caught.
    let shutdown = shutdown_signal();

    info!(
        environment = %settings.environment,
        "Taskboard backend starting..."
    );

    if let Err(e) = Supervisor::new(settings).run(shutdown).await {
        error!("Taskboard backend exiting: {e}");
        std::process::exit(1);
    }

    info!("Taskboard backend shutdown complete.");
    Ok(())
}
