//! Timing and lifecycle tests for the streaming session loop.
//!
//! All tests run on a paused Tokio clock, so intervals and send deadlines
//! elapse instantly and deterministically.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use flightsim_core::config::SimulationParams;
use flightsim_core::entropy::{Entropy, FixedEntropy, RandEntropy};
use flightsim_core::session::{
    DeliveryError, SampleSink, Session, SessionConfig, SessionOutcome, SessionReport,
};
use flightsim_core::state::{FlightState, SharedFlightState};
use flightsim_types::{LaunchPhase, SessionId, TelemetrySample};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

const INTERVAL: Duration = Duration::from_millis(500);
const SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// Forwards samples into a channel, optionally failing after `fail_after`
/// successful sends.
struct ChannelSink {
    tx: mpsc::UnboundedSender<TelemetrySample>,
    fail_after: Option<u64>,
    sent: u64,
}

impl ChannelSink {
    fn new() -> (Self, mpsc::UnboundedReceiver<TelemetrySample>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            tx,
            fail_after: None,
            sent: 0,
        };
        (sink, rx)
    }

    fn failing_after(n: u64) -> (Self, mpsc::UnboundedReceiver<TelemetrySample>) {
        let (mut sink, rx) = Self::new();
        sink.fail_after = Some(n);
        (sink, rx)
    }
}

impl SampleSink for ChannelSink {
    async fn deliver(&mut self, sample: &TelemetrySample) -> Result<(), DeliveryError> {
        if self.fail_after.is_some_and(|n| self.sent >= n) {
            return Err(DeliveryError::Transport {
                message: "peer went away".to_owned(),
            });
        }
        self.tx
            .send(sample.clone())
            .map_err(|e| DeliveryError::Transport {
                message: e.to_string(),
            })?;
        self.sent += 1;
        Ok(())
    }
}

/// A peer that never acknowledges a write.
struct StalledSink;

impl SampleSink for StalledSink {
    async fn deliver(&mut self, _sample: &TelemetrySample) -> Result<(), DeliveryError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Captures formatted log output so tests can assert on what an operator
/// would see on the console.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Install a thread-local subscriber at the shipped default level.
fn capture_info_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}

fn config() -> SessionConfig {
    SessionConfig {
        tick_interval: INTERVAL,
        send_timeout: SEND_TIMEOUT,
    }
}

fn spawn_session<S, E>(
    sink: S,
    entropy: E,
    flight: &SharedFlightState,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<SessionReport>
where
    S: SampleSink + 'static,
    E: Entropy + Send + 'static,
{
    let session = Session::new(
        sink,
        entropy,
        flight.clone(),
        SimulationParams::default(),
        config(),
        shutdown,
    );
    tokio::spawn(session.run())
}

fn drain(rx: &mut mpsc::UnboundedReceiver<TelemetrySample>) -> Vec<TelemetrySample> {
    let mut out = Vec::new();
    while let Ok(sample) = rx.try_recv() {
        out.push(sample);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn one_sample_per_interval_and_none_before_the_first() {
    let start = Instant::now();
    let flight = FlightState::default().into_shared();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sink, mut rx) = ChannelSink::new();

    let handle = spawn_session(sink, RandEntropy::seeded(1), &flight, shutdown_rx);

    sleep_until(start + Duration::from_millis(499)).await;
    assert!(drain(&mut rx).is_empty(), "no sample before the first interval");

    sleep_until(start + Duration::from_millis(750)).await;
    assert_eq!(drain(&mut rx).len(), 1);

    sleep_until(start + Duration::from_millis(2_750)).await;
    assert_eq!(drain(&mut rx).len(), 4);

    shutdown_tx.send(true).unwrap();
    let report = handle.await.unwrap();
    assert!(matches!(report.outcome, SessionOutcome::Shutdown));
    assert_eq!(report.samples_delivered, 5);
    assert_eq!(flight.lock().await.ticks(), 5);
}

#[tokio::test(start_paused = true)]
async fn failed_delivery_ends_the_session() {
    let flight = FlightState::default().into_shared();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sink, mut rx) = ChannelSink::failing_after(2);

    let report = spawn_session(sink, RandEntropy::seeded(2), &flight, shutdown_rx)
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        SessionOutcome::DeliveryFailed(DeliveryError::Transport { .. })
    ));
    assert_eq!(report.samples_delivered, 2);
    assert_eq!(drain(&mut rx).len(), 2);
    // The failing tick still advanced the shared state before the send.
    assert_eq!(flight.lock().await.ticks(), 3);
}

#[tokio::test(start_paused = true)]
async fn stalled_peer_is_dropped_after_the_send_deadline() {
    let start = Instant::now();
    let flight = FlightState::default().into_shared();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let report = spawn_session(StalledSink, RandEntropy::seeded(3), &flight, shutdown_rx)
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        SessionOutcome::DeliveryFailed(DeliveryError::Timeout { timeout_ms: 100 })
    ));
    assert_eq!(report.samples_delivered, 0);
    let elapsed = start.elapsed();
    assert!(elapsed >= INTERVAL + SEND_TIMEOUT);
    assert!(elapsed < INTERVAL * 2);
}

#[tokio::test(start_paused = true)]
async fn one_failing_session_leaves_the_other_streaming() {
    let start = Instant::now();
    let flight = FlightState::default().into_shared();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let (failing, _failing_rx) = ChannelSink::failing_after(2);
    let (survivor, mut survivor_rx) = ChannelSink::new();

    let failing_handle = spawn_session(
        failing,
        FixedEntropy::maximum(),
        &flight,
        shutdown_rx.clone(),
    );
    let survivor_handle = spawn_session(
        survivor,
        FixedEntropy::maximum().with_hits(true),
        &flight,
        shutdown_rx,
    );

    sleep_until(start + Duration::from_millis(1_750)).await;
    assert!(failing_handle.is_finished());
    let ticks_at_failure = flight.lock().await.ticks();

    sleep_until(start + Duration::from_millis(5_250)).await;
    assert!(!survivor_handle.is_finished());

    let received = drain(&mut survivor_rx);
    assert_eq!(received.len(), 10);
    assert!(
        received
            .windows(2)
            .all(|pair| pair.first().map(|s| s.launch_status)
                <= pair.last().map(|s| s.launch_status))
    );

    let state = flight.lock().await;
    assert_eq!(state.ticks(), 13);
    assert!(state.ticks() > ticks_at_failure);
    assert_eq!(state.launch_phase(), LaunchPhase::LANDED);

    let report = failing_handle.await.unwrap();
    assert_eq!(report.samples_delivered, 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_first_tick_sends_nothing() {
    let flight = FlightState::default().into_shared();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sink, mut rx) = ChannelSink::new();

    let handle = spawn_session(sink, RandEntropy::seeded(4), &flight, shutdown_rx);
    shutdown_tx.send(true).unwrap();

    let report = handle.await.unwrap();
    assert!(matches!(report.outcome, SessionOutcome::Shutdown));
    assert_eq!(report.samples_delivered, 0);
    assert!(drain(&mut rx).is_empty());
    assert_eq!(flight.lock().await.ticks(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_shutdown_sender_ends_the_session() {
    let flight = FlightState::default().into_shared();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sink, _rx) = ChannelSink::new();

    let handle = spawn_session(sink, RandEntropy::seeded(5), &flight, shutdown_rx);
    drop(shutdown_tx);

    let report = handle.await.unwrap();
    assert!(matches!(report.outcome, SessionOutcome::Shutdown));
}

#[tokio::test(start_paused = true)]
async fn injected_clock_and_id_are_used() {
    let flight = FlightState::default().into_shared();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sink, mut rx) = ChannelSink::new();
    let id = SessionId::new();

    let session = Session::new(
        sink,
        FixedEntropy::maximum(),
        flight.clone(),
        SimulationParams::default(),
        config(),
        shutdown_rx,
    )
    .with_id(id)
    .with_clock(|| 1_234);
    assert_eq!(session.id(), id);

    let handle = tokio::spawn(session.run());
    let sample = rx.recv().await.unwrap();
    assert_eq!(sample.timestamp, 1_234);
    assert!(sample.raw_data.starts_with("RAW|1234|"));

    shutdown_tx.send(true).unwrap();
    let report = handle.await.unwrap();
    assert_eq!(report.id, id);
}

#[tokio::test(start_paused = true)]
async fn every_delivered_sample_is_summarised_at_info() {
    let (logs, _guard) = capture_info_logs();
    let flight = FlightState::from_parts(0.0, -7.7714, 110.3775, LaunchPhase::ASCENDING)
        .into_shared();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sink, mut rx) = ChannelSink::new();

    let handle = spawn_session(sink, FixedEntropy::new(0.5, false), &flight, shutdown_rx);
    rx.recv().await.unwrap();
    rx.recv().await.unwrap();
    shutdown_tx.send(true).unwrap();
    let report = handle.await.unwrap();
    assert_eq!(report.samples_delivered, 2);

    let output = logs.contents();
    let summaries: Vec<&str> = output
        .lines()
        .filter(|line| line.contains("Sent sample"))
        .collect();
    assert_eq!(summaries.len(), 2, "log output: {output}");
    for line in summaries {
        assert!(line.contains(" INFO "), "{line}");
        assert!(line.contains("altitude="), "{line}");
        assert!(line.contains("launch_status="), "{line}");
        assert!(line.contains("error_code="), "{line}");
    }
}
