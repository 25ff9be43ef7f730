//! Shared type definitions for the FlightSim telemetry source.
//!
//! Every value that crosses the wire to the ground-station dashboard is
//! defined here. Types flow downstream to `TypeScript` via `ts-rs` so the
//! dashboard and the simulator agree on field names.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for streaming session identifiers
//! - [`enums`] -- Launch phase and error code value types
//! - [`sample`] -- The per-tick [`TelemetrySample`] record

pub mod enums;
pub mod ids;
pub mod sample;

// Re-export all public types at crate root for convenience.
pub use enums::{ErrorCode, LaunchPhase};
pub use ids::SessionId;
pub use sample::TelemetrySample;
