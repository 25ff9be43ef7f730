//! Axum router construction for the telemetry server.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware allowing any origin, so a dashboard served from
//! anywhere can connect.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Path of the telemetry `WebSocket` endpoint.
pub const WS_PATH: &str = "/ws";

/// Build the complete Axum router for the telemetry server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws` -- `WebSocket` telemetry stream
/// - `GET /api/status` -- flight state snapshot
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route(WS_PATH, get(ws::ws_telemetry))
        .route("/api/status", get(handlers::get_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
