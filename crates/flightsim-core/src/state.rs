//! Process-wide flight state shared by every streaming session.
//!
//! There is exactly one [`FlightState`] per process. Every connected
//! session advances it on its own schedule, so with several clients the
//! ticks interleave and each client sees a world also moved by the others.
//! The state sits behind a [`tokio::sync::Mutex`] so each tick's
//! read-modify-write is atomic; the order in which sessions tick is still
//! up to the scheduler.

use std::sync::Arc;

use flightsim_types::LaunchPhase;
use tokio::sync::Mutex;

use crate::config::SimulationParams;

/// Shared handle to the single process-wide [`FlightState`].
pub type SharedFlightState = Arc<Mutex<FlightState>>;

/// Evolving state of the simulated flight.
///
/// # Invariants
///
/// - `altitude >= 0.0` at all times.
/// - `previous_altitude` equals `altitude` as it stood at the end of the
///   previous tick.
/// - `launch_phase` never decreases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    altitude: f64,
    previous_altitude: f64,
    latitude: f64,
    longitude: f64,
    launch_phase: LaunchPhase,
    ticks: u64,
}

impl FlightState {
    /// A vehicle on the pad at the given position.
    pub const fn at_origin(latitude: f64, longitude: f64) -> Self {
        Self {
            altitude: 0.0,
            previous_altitude: 0.0,
            latitude,
            longitude,
            launch_phase: LaunchPhase::PRE_LAUNCH,
            ticks: 0,
        }
    }

    /// A vehicle on the pad at the configured origin.
    pub const fn from_params(params: &SimulationParams) -> Self {
        Self::at_origin(params.origin_latitude, params.origin_longitude)
    }

    /// Create a state from explicit parameters (useful for testing and
    /// state restoration). Negative altitudes are clamped to zero.
    pub fn from_parts(
        altitude: f64,
        latitude: f64,
        longitude: f64,
        launch_phase: LaunchPhase,
    ) -> Self {
        let altitude = altitude.max(0.0);
        Self {
            altitude,
            previous_altitude: altitude,
            latitude,
            longitude,
            launch_phase,
            ticks: 0,
        }
    }

    /// Wrap this state in a [`SharedFlightState`].
    pub fn into_shared(self) -> SharedFlightState {
        Arc::new(Mutex::new(self))
    }

    /// Current altitude in meters.
    pub const fn altitude(&self) -> f64 {
        self.altitude
    }

    /// Altitude at the end of the previous tick.
    pub const fn previous_altitude(&self) -> f64 {
        self.previous_altitude
    }

    /// Current latitude in degrees.
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Current longitude in degrees.
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Current launch phase.
    pub const fn launch_phase(&self) -> LaunchPhase {
        self.launch_phase
    }

    /// Number of ticks applied since process start, across all sessions.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Move the launch phase forward to `phase`.
    ///
    /// Requests to move backwards are ignored. Returns `true` if the
    /// phase changed.
    pub fn promote_to(&mut self, phase: LaunchPhase) -> bool {
        if phase > self.launch_phase {
            self.launch_phase = phase;
            true
        } else {
            false
        }
    }

    /// Move to the next launch phase, saturating at [`LaunchPhase::LANDED`].
    pub(crate) fn advance_phase(&mut self) {
        self.launch_phase = self.launch_phase.next();
    }

    /// Apply a signed altitude step, clamping at the ground.
    pub(crate) fn apply_altitude_step(&mut self, step: f64) {
        self.altitude = (self.altitude + step).max(0.0);
    }

    /// Close out the altitude bookkeeping for this tick.
    ///
    /// Returns `altitude - previous_altitude` and records the current
    /// altitude as the baseline for the next tick.
    pub(crate) fn commit_altitude(&mut self) -> f64 {
        let delta = self.altitude - self.previous_altitude;
        self.previous_altitude = self.altitude;
        delta
    }

    /// Shift the position by a small offset. There is no geographic bound.
    pub(crate) fn drift(&mut self, d_latitude: f64, d_longitude: f64) {
        self.latitude += d_latitude;
        self.longitude += d_longitude;
    }

    pub(crate) const fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }
}

impl Default for FlightState {
    fn default() -> Self {
        Self::from_params(&SimulationParams::default())
    }
}
