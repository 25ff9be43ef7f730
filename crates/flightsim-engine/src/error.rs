//! Error types for the FlightSim engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the FlightSim engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: flightsim_core::config::ConfigError,
    },

    /// The telemetry server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: flightsim_server::ServerError,
    },
}
