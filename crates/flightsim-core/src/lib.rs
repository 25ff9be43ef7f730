//! Flight model and streaming loop for the FlightSim telemetry source.
//!
//! This crate owns everything with behaviour in it: the shared
//! [`FlightState`], the per-tick simulation step that turns it into a
//! [`TelemetrySample`], and the per-connection [`Session`] loop that
//! emits one sample per interval. Transport concerns (HTTP, `WebSocket`)
//! live in `flightsim-server` and plug in through [`SampleSink`].
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `flightsim-config.yaml` into
//!   strongly-typed structs.
//! - [`entropy`] -- [`Entropy`] trait with the `rand`-backed source and a
//!   deterministic fixed source for tests.
//! - [`state`] -- [`FlightState`] and its shared, mutex-guarded handle.
//! - [`engine`] -- The single-tick simulation step.
//! - [`session`] -- The periodic streaming loop and its [`SampleSink`] seam.
//!
//! [`FlightState`]: state::FlightState
//! [`TelemetrySample`]: flightsim_types::TelemetrySample
//! [`Session`]: session::Session
//! [`SampleSink`]: session::SampleSink
//! [`Entropy`]: entropy::Entropy

pub mod config;
pub mod engine;
pub mod entropy;
pub mod session;
pub mod state;
