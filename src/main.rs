//! # Ride Simulator
//!
//! Runs the configured fleet until Ctrl-C:
//! 1.  Set up tracing and load [`SimConfig`] from the environment.
//! 2.  Build the [`SimManager`] with one HTTP session per account.
//! 3.  Start every actor (unless `SIM_AUTOSTART=false`).
//! 4.  On Ctrl-C, stop the fleet and wait for every loop to unwind.

use ride_sim::lifecycle::{setup_tracing, SimConfig, SimManager};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = SimConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e.to_string()
    })?;
    info!(
        users = config.users.len(),
        api = %config.api_base_url,
        time_multiplier = config.time_multiplier,
        "Starting ride simulator"
    );

    let manager = SimManager::new(&config).map_err(|e| e.to_string())?;
    let client = manager.client();

    if config.autostart {
        let statuses = client.start_all().await.map_err(|e| e.to_string())?;
        info!(actors = statuses.len(), "Fleet started");
    } else {
        info!("Autostart disabled; fleet idle");
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C; shutting down");
    }

    info!("Ctrl-C received, stopping fleet");
    if let Err(e) = client.stop_all().await {
        warn!(error = %e, "Stop all failed");
    }
    drop(client);

    manager.shutdown().await.map_err(|e| e.to_string())
}
