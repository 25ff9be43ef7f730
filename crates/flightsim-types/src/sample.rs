//! The per-tick telemetry record pushed to dashboard clients.
//!
//! Field names on the wire are fixed by the ground-station dashboard:
//! `timestamp`, `temperature`, `voltage`, `gyroX`, `gyroY`, `gyroZ`,
//! `altitude`, `altitudeDiff`, `latitude`, `longitude`, `launchStatus`,
//! `errorCode`, `rawData`. Renaming a Rust field here breaks the dashboard.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ErrorCode, LaunchPhase};

/// One simulated sensor reading, produced fresh every tick.
///
/// Samples are plain values. They are handed to the transport for
/// encoding and dropped immediately after delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TelemetrySample {
    /// Seconds since the Unix epoch at the moment of sampling.
    pub timestamp: i64,
    /// Payload temperature in degrees Celsius, `20..=35`.
    pub temperature: f64,
    /// Battery voltage, `11.1..=12.6`.
    pub voltage: f64,
    /// Angular rate around X in degrees per second, `-180..=180`.
    pub gyro_x: f64,
    /// Angular rate around Y in degrees per second, `-180..=180`.
    pub gyro_y: f64,
    /// Angular rate around Z in degrees per second, `-180..=180`.
    pub gyro_z: f64,
    /// Altitude above the launch site in meters, never negative.
    pub altitude: f64,
    /// `altitude` minus the altitude reported by the previous tick.
    pub altitude_diff: f64,
    /// Simulated GPS latitude in degrees.
    pub latitude: f64,
    /// Simulated GPS longitude in degrees.
    pub longitude: f64,
    /// Current flight phase.
    pub launch_status: LaunchPhase,
    /// Injected fault for this tick, `0` when nominal.
    pub error_code: ErrorCode,
    /// Pipe-delimited text line for raw-frame displays.
    pub raw_data: String,
}

impl TelemetrySample {
    /// Encode the sample as a single JSON object.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
