//! `WebSocket` handler for the telemetry stream.
//!
//! Clients connect to `GET /ws` and receive one JSON-encoded
//! [`TelemetrySample`] per tick as a text frame. Each connection runs its
//! own [`Session`]; nothing the client sends is read.
//!
//! Any origin is accepted.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use flightsim_core::session::{DeliveryError, SampleSink, Session, SessionOutcome};
use flightsim_types::TelemetrySample;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming telemetry.
///
/// # Route
///
/// `GET /ws`
///
/// A request that is not a valid upgrade is logged and answered with the
/// extractor's rejection; no session is created for it.
pub async fn ws_telemetry(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match ws {
        Ok(ws) => ws
            .on_failed_upgrade(|error| warn!(%error, "WebSocket upgrade failed"))
            .on_upgrade(|socket| stream_telemetry(socket, state)),
        Err(rejection) => {
            warn!(
                %rejection,
                status = rejection.status().as_u16(),
                "WebSocket handshake rejected"
            );
            rejection.into_response()
        }
    }
}

/// [`SampleSink`] writing JSON text frames to an upgraded socket.
pub struct WebSocketSink {
    socket: WebSocket,
}

impl WebSocketSink {
    /// Wrap an upgraded socket.
    pub const fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

impl SampleSink for WebSocketSink {
    async fn deliver(&mut self, sample: &TelemetrySample) -> Result<(), DeliveryError> {
        let json = sample.to_json()?;
        self.socket
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| DeliveryError::Transport {
                message: e.to_string(),
            })
    }
}

/// Run one streaming session over the upgraded socket.
///
/// The socket is owned by the session and closed when it returns.
async fn stream_telemetry(socket: WebSocket, state: Arc<AppState>) {
    if state.is_shutting_down() {
        debug!("Rejecting WebSocket client during shutdown");
        return;
    }

    let _live = state.track_session();

    let session = Session::new(
        WebSocketSink::new(socket),
        state.session_entropy(),
        Arc::clone(&state.flight),
        state.params,
        state.session_config,
        state.subscribe_shutdown(),
    );

    info!(
        session = %session.id(),
        active_sessions = state.active_sessions(),
        "Client connected"
    );

    let report = session.run().await;

    if let SessionOutcome::DeliveryFailed(DeliveryError::Transport { message }) = &report.outcome
    {
        debug!(session = %report.id, %message, "WebSocket write failed");
    }
}
