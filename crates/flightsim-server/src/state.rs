//! Shared application state for the telemetry server.
//!
//! [`AppState`] holds the single process-wide flight state, the stream
//! settings every new session is built with, a live-session counter, and
//! the shutdown signal that ends all sessions.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use flightsim_core::config::{FlightSimConfig, SimulationParams};
use flightsim_core::entropy::RandEntropy;
use flightsim_core::session::SessionConfig;
use flightsim_core::state::{FlightState, SharedFlightState};
use tokio::sync::watch;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
pub struct AppState {
    /// The flight state advanced by every session.
    pub flight: SharedFlightState,
    /// Flight model parameters handed to each session.
    pub params: SimulationParams,
    /// Cadence and send deadline for each session.
    pub session_config: SessionConfig,
    shutdown_tx: watch::Sender<bool>,
    active_sessions: AtomicUsize,
    sessions_started: AtomicU64,
}

impl AppState {
    /// Create application state with a fresh flight on the pad.
    pub fn new(config: &FlightSimConfig) -> Self {
        Self::with_flight(config, FlightState::from_params(&config.simulation))
    }

    /// Create application state around an existing flight state.
    pub fn with_flight(config: &FlightSimConfig, flight: FlightState) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            flight: flight.into_shared(),
            params: config.simulation,
            session_config: SessionConfig::from(&config.stream),
            shutdown_tx,
            active_sessions: AtomicUsize::new(0),
            sessions_started: AtomicU64::new(0),
        }
    }

    /// Receiver that flips to `true` when the server shuts down.
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Signal every session to stop.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Whether [`AppState::shutdown`] has been called.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Number of sessions currently streaming.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Mark a session as live until the returned guard is dropped.
    pub fn track_session(&self) -> SessionGuard<'_> {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        SessionGuard { state: self }
    }

    /// Entropy for the next session.
    ///
    /// With a configured seed, session `n` gets `seed + n` so a run is
    /// reproducible for a fixed connection order. Otherwise each session
    /// is seeded from the operating system.
    pub fn session_entropy(&self) -> RandEntropy {
        let n = self.sessions_started.fetch_add(1, Ordering::Relaxed);
        RandEntropy::from_optional_seed(self.params.seed.map(|seed| seed.wrapping_add(n)))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&FlightSimConfig::default())
    }
}

/// Decrements the live-session count on drop.
pub struct SessionGuard<'a> {
    state: &'a AppState,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.state.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_guard_tracks_live_sessions() {
        let state = AppState::default();
        assert_eq!(state.active_sessions(), 0);
        let first = state.track_session();
        let second = state.track_session();
        assert_eq!(state.active_sessions(), 2);
        drop(first);
        assert_eq!(state.active_sessions(), 1);
        drop(second);
        assert_eq!(state.active_sessions(), 0);
    }

    #[test]
    fn shutdown_reaches_subscribers() {
        let state = AppState::default();
        let rx = state.subscribe_shutdown();
        assert!(!*rx.borrow());
        state.shutdown();
        assert!(*rx.borrow());
        assert!(state.is_shutting_down());
    }

    #[test]
    fn seeded_sessions_get_distinct_streams() {
        use flightsim_core::entropy::Entropy;

        let mut config = FlightSimConfig::default();
        config.simulation.seed = Some(10);
        let state = AppState::new(&config);

        let mut first = state.session_entropy();
        let mut second = state.session_entropy();
        let a: Vec<u8> = (0..16).map(|_| first.uniform_int(0, 255)).collect();
        let b: Vec<u8> = (0..16).map(|_| second.uniform_int(0, 255)).collect();
        assert_ne!(a, b);

        let mut replay = RandEntropy::seeded(10);
        let c: Vec<u8> = (0..16).map(|_| replay.uniform_int(0, 255)).collect();
        assert_eq!(a, c);
    }
}
