//! REST endpoint handlers for the telemetry server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Shared flight state and live session count |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use flightsim_types::LaunchPhase;

use crate::state::AppState;

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Current altitude in meters.
    pub altitude: f64,
    /// Current latitude in degrees.
    pub latitude: f64,
    /// Current longitude in degrees.
    pub longitude: f64,
    /// Current launch phase as its wire integer.
    pub launch_status: LaunchPhase,
    /// Dashboard label of the launch phase.
    pub launch_label: String,
    /// Ticks applied since process start, across all sessions.
    pub ticks: u64,
    /// Sessions currently streaming.
    pub active_sessions: usize,
    /// Configured milliseconds between samples per session.
    pub tick_interval_ms: u64,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the flight status and endpoints.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = read_status(&state).await;
    let altitude = format!("{:.1}", status.altitude);
    let phase = status.launch_status.value();
    let label = status.launch_label;
    let ticks = status.ticks;
    let sessions = status.active_sessions;
    let interval = status.tick_interval_ms;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta http-equiv="refresh" content="2">
    <title>FlightSim Telemetry</title>
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 2rem; color: #222; }}
        table {{ border-collapse: collapse; }}
        th, td {{ text-align: left; padding: 0.25rem 1rem 0.25rem 0; }}
        th {{ font-weight: normal; color: #666; }}
        td {{ font-variant-numeric: tabular-nums; }}
    </style>
</head>
<body>
    <h1>FlightSim Telemetry</h1>
    <p>One sample every {interval} ms per connected client.</p>
    <table>
        <tr><th>Phase</th><td>{phase} {label}</td></tr>
        <tr><th>Altitude (m)</th><td>{altitude}</td></tr>
        <tr><th>Ticks</th><td>{ticks}</td></tr>
        <tr><th>Clients</th><td>{sessions}</td></tr>
    </table>
    <h2>Endpoints</h2>
    <ul>
        <li><a href="/api/status">GET /api/status</a>: flight state snapshot</li>
        <li><code>ws://host:port/ws</code>: live telemetry stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status -- flight state snapshot
// ---------------------------------------------------------------------------

/// Return the shared flight state without advancing it.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(read_status(&state).await)
}

async fn read_status(state: &AppState) -> StatusResponse {
    let flight = *state.flight.lock().await;
    StatusResponse {
        altitude: flight.altitude(),
        latitude: flight.latitude(),
        longitude: flight.longitude(),
        launch_status: flight.launch_phase(),
        launch_label: flight.launch_phase().label().to_owned(),
        ticks: flight.ticks(),
        active_sessions: state.active_sessions(),
        tick_interval_ms: u64::try_from(state.session_config.tick_interval.as_millis())
            .unwrap_or(u64::MAX),
    }
}
