//! Per-connection streaming loop.
//!
//! A [`Session`] owns one client connection (behind the [`SampleSink`]
//! seam) for its whole lifetime:
//!
//! ```text
//! Connected --first interval elapses--> Streaming --send fails / times out--> Closed
//!                                           |
//!                                           +--shutdown signal--> Closed
//! ```
//!
//! The first sample goes out one full interval after the session starts,
//! never immediately. Each tick locks the shared flight state, advances it,
//! releases the lock and then sends. Sending is bounded by a per-send
//! deadline, so a stalled peer ends its own session instead of hanging it.
//! A failed send is terminal: no retry, no reconnect. The timer and the
//! sink are dropped when [`Session::run`] returns.

use std::time::Duration;

use flightsim_types::{SessionId, TelemetrySample};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::{SimulationParams, StreamConfig};
use crate::engine;
use crate::entropy::Entropy;
use crate::state::SharedFlightState;

/// Why a sample could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The transport reported an error while writing.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The sample could not be encoded for the wire.
    #[error("encode error: {source}")]
    Encode {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// The send did not finish within the per-send deadline.
    #[error("send timed out after {timeout_ms}ms")]
    Timeout {
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },
}

/// Destination for the samples of one session.
///
/// The transport layer implements this for its connection type; the
/// session loop only knows how to hand over a sample and observe failure.
pub trait SampleSink: Send {
    /// Encode and write one sample to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the sample cannot be encoded or the
    /// connection is no longer writable.
    fn deliver(
        &mut self,
        sample: &TelemetrySample,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Timing parameters for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time between samples.
    pub tick_interval: Duration,
    /// Longest a single send may take.
    pub send_timeout: Duration,
}

impl From<&StreamConfig> for SessionConfig {
    fn from(stream: &StreamConfig) -> Self {
        Self {
            tick_interval: stream.tick_interval(),
            send_timeout: stream.send_timeout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// A send failed or timed out.
    DeliveryFailed(DeliveryError),
    /// The process is shutting down.
    Shutdown,
}

/// Summary returned when a session closes.
#[derive(Debug)]
pub struct SessionReport {
    /// The session that closed.
    pub id: SessionId,
    /// Samples successfully written to the peer.
    pub samples_delivered: u64,
    /// Why the session ended.
    pub outcome: SessionOutcome,
}

/// One client's streaming loop.
pub struct Session<S, E> {
    id: SessionId,
    sink: S,
    entropy: E,
    flight: SharedFlightState,
    params: SimulationParams,
    config: SessionConfig,
    shutdown: watch::Receiver<bool>,
    clock: fn() -> i64,
}

impl<S, E> Session<S, E>
where
    S: SampleSink,
    E: Entropy + Send,
{
    /// Build a session over `sink`, advancing the shared `flight` state.
    ///
    /// The session ends when `shutdown` carries `true` or its sender is
    /// dropped.
    pub fn new(
        sink: S,
        entropy: E,
        flight: SharedFlightState,
        params: SimulationParams,
        config: SessionConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            sink,
            entropy,
            flight,
            params,
            config,
            shutdown,
            clock: engine::unix_timestamp,
        }
    }

    /// Use a fixed identifier instead of a fresh one.
    #[must_use]
    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    /// Replace the wall clock used to stamp samples.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// The identifier used in this session's log lines.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Stream samples until delivery fails or shutdown is signalled.
    pub async fn run(mut self) -> SessionReport {
        let period = self.config.tick_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            session = %self.id,
            tick_interval_ms = period.as_millis(),
            "Session streaming"
        );

        let mut samples_delivered: u64 = 0;

        let outcome = loop {
            if *self.shutdown.borrow_and_update() {
                break SessionOutcome::Shutdown;
            }

            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        // Sender dropped: nobody can signal us any more.
                        break SessionOutcome::Shutdown;
                    }
                }

                _ = ticker.tick() => {
                    let sample = self.tick().await;
                    match self.send(&sample).await {
                        Ok(()) => {
                            samples_delivered = samples_delivered.saturating_add(1);
                            info!(
                                session = %self.id,
                                altitude = sample.altitude,
                                launch_status = sample.launch_status.value(),
                                error_code = sample.error_code.value(),
                                "Sent sample"
                            );
                        }
                        Err(error) => break SessionOutcome::DeliveryFailed(error),
                    }
                }
            }
        };

        match &outcome {
            SessionOutcome::DeliveryFailed(error) => warn!(
                session = %self.id,
                samples_delivered,
                %error,
                "Session closed: delivery failed"
            ),
            SessionOutcome::Shutdown => info!(
                session = %self.id,
                samples_delivered,
                "Session closed: shutdown"
            ),
        }

        SessionReport {
            id: self.id,
            samples_delivered,
            outcome,
        }
    }

    /// Advance the shared state by one tick. The lock is released before
    /// returning so sends never block other sessions.
    async fn tick(&mut self) -> TelemetrySample {
        let timestamp = (self.clock)();
        let mut flight = self.flight.lock().await;
        engine::advance(&mut flight, &mut self.entropy, &self.params, timestamp)
    }

    /// Deliver one sample within the per-send deadline.
    async fn send(&mut self, sample: &TelemetrySample) -> Result<(), DeliveryError> {
        let deadline = self.config.send_timeout;
        match tokio::time::timeout(deadline, self.sink.deliver(sample)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(DeliveryError::Timeout {
                timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
