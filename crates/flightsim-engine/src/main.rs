//! FlightSim telemetry source binary.
//!
//! Loads configuration, starts the telemetry server, and streams
//! synthetic flight telemetry to every `WebSocket` client until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `flightsim-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Create the shared flight state at the configured origin
//! 4. Bind the listening port (fatal if the port is taken)
//! 5. Serve until `Ctrl-C`, then signal every session to close

mod error;

use std::path::Path;
use std::sync::Arc;

use flightsim_core::config::FlightSimConfig;
use flightsim_server::{AppState, ServerConfig, TelemetryServer, WS_PATH};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "flightsim-config.yaml";

/// Application entry point for the FlightSim engine.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the port cannot be
/// bound, or the server fails while serving.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, loaded_from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("flightsim-engine starting");
    if !loaded_from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        host = config.server.host,
        port = config.server.port,
        tick_interval_ms = config.stream.tick_interval_ms,
        send_timeout_ms = config.stream.send_timeout_ms,
        seeded = config.simulation.seed.is_some(),
        "Configuration loaded"
    );

    // 3. Create the shared flight state.
    let state = Arc::new(AppState::new(&config));
    info!(
        latitude = config.simulation.origin_latitude,
        longitude = config.simulation.origin_longitude,
        "Flight state initialized on the pad"
    );

    // 4. Bind.
    let server = TelemetryServer::bind(&ServerConfig::from(&config.server), state).await?;
    let addr = server.local_addr()?;
    info!(
        %addr,
        path = WS_PATH,
        "Waiting for dashboard connections"
    );

    // 5. Serve until Ctrl-C.
    server.serve(wait_for_ctrl_c()).await?;

    info!("flightsim-engine shutdown complete");
    Ok(())
}

/// Load `flightsim-config.yaml` if present, otherwise defaults.
///
/// Returns the configuration and whether it came from the file.
fn load_config() -> Result<(FlightSimConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((FlightSimConfig::from_file(config_path)?, true))
    } else {
        let mut config = FlightSimConfig::default();
        config
            .server
            .apply_overrides(|key| std::env::var(key).ok())?;
        Ok((config, false))
    }
}

/// Resolve on `Ctrl-C`. If the handler cannot be installed the server runs
/// until killed.
async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl-C");
            warn!("Graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}
