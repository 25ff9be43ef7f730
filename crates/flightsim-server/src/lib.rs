//! Telemetry server for the FlightSim telemetry source.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) that streams one JSON
//!   [`TelemetrySample`] per tick to each connected client
//! - **Status endpoint** (`/api/status`) with the shared flight state and
//!   the number of live sessions
//! - **Minimal HTML page** (`GET /`) linking the above
//!
//! # Architecture
//!
//! Every accepted upgrade becomes an independent
//! [`Session`](flightsim_core::session::Session) running on its own Tokio
//! task. All sessions advance the same mutex-guarded flight state held in
//! [`AppState`]. A shutdown signal in [`AppState`] ends every session when
//! the process stops.
//!
//! [`TelemetrySample`]: flightsim_types::TelemetrySample

pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::{WS_PATH, build_router};
pub use server::{ServerConfig, ServerError, TelemetryServer};
pub use state::AppState;
