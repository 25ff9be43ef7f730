//! End-to-end tests for the telemetry `WebSocket` stream.
//!
//! Each test binds a real server on an ephemeral localhost port with a
//! short tick interval and connects with a `tokio-tungstenite` client.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use flightsim_core::config::FlightSimConfig;
use flightsim_server::server::{ServerConfig, ServerError, TelemetryServer};
use flightsim_server::state::AppState;
use flightsim_types::TelemetrySample;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

async fn start() -> TestServer {
    let mut config = FlightSimConfig::default();
    config.stream.tick_interval_ms = 20;
    config.stream.send_timeout_ms = 1_000;
    config.simulation.seed = Some(7);

    let state = Arc::new(AppState::new(&config));
    let server_config = ServerConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
    };
    let server = TelemetryServer::bind(&server_config, Arc::clone(&state))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve(async move {
        let _ = stop_rx.await;
    }));

    TestServer {
        addr,
        state,
        stop: Some(stop_tx),
        handle,
    }
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _response) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    client
}

/// Read the next telemetry frame, failing the test on anything else.
async fn next_sample(client: &mut Client) -> (serde_json::Value, TelemetrySample) {
    let frame = timeout(WAIT, client.next()).await.unwrap().unwrap().unwrap();
    let Message::Text(text) = frame else {
        panic!("expected a text frame, got {frame:?}");
    };
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let sample: TelemetrySample = serde_json::from_str(&text).unwrap();
    (value, sample)
}

async fn wait_for_sessions(state: &AppState, expected: usize) {
    timeout(WAIT, async {
        while state.active_sessions() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn client_receives_json_samples() {
    let server = start().await;
    let mut client = connect(server.addr).await;

    let mut previous: Option<TelemetrySample> = None;
    for _ in 0..5 {
        let (value, sample) = next_sample(&mut client).await;
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 13);
        for key in [
            "timestamp",
            "temperature",
            "voltage",
            "gyroX",
            "gyroY",
            "gyroZ",
            "altitude",
            "altitudeDiff",
            "latitude",
            "longitude",
            "launchStatus",
            "errorCode",
            "rawData",
        ] {
            assert!(object.contains_key(key), "missing field {key}");
        }
        assert!(sample.altitude >= 0.0);
        assert!(sample.raw_data.starts_with("RAW|"));
        if let Some(prev) = &previous {
            assert!(sample.launch_status >= prev.launch_status);
        }
        previous = Some(sample);
    }

    assert_eq!(server.state.active_sessions(), 1);
}

#[tokio::test]
async fn disconnecting_one_client_leaves_the_other_streaming() {
    let server = start().await;
    let mut stays = connect(server.addr).await;
    let leaves = connect(server.addr).await;

    let _ = next_sample(&mut stays).await;
    wait_for_sessions(&server.state, 2).await;

    drop(leaves);
    wait_for_sessions(&server.state, 1).await;

    let ticks_before = server.state.flight.lock().await.ticks();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let ticks_after = server.state.flight.lock().await.ticks();
    assert!(ticks_after > ticks_before);

    let _ = next_sample(&mut stays).await;
    assert_eq!(server.state.active_sessions(), 1);
}

#[tokio::test]
async fn shutdown_closes_every_stream() {
    let mut server = start().await;
    let mut first = connect(server.addr).await;
    let mut second = connect(server.addr).await;
    let _ = next_sample(&mut first).await;
    let _ = next_sample(&mut second).await;

    server.stop.take().unwrap().send(()).unwrap();
    timeout(WAIT, &mut server.handle).await.unwrap().unwrap().unwrap();
    assert!(server.state.is_shutting_down());

    for client in [&mut first, &mut second] {
        // Drain frames already in flight until the connection ends.
        timeout(WAIT, async {
            while let Some(Ok(_)) = client.next().await {}
        })
        .await
        .unwrap();
    }
    wait_for_sessions(&server.state, 0).await;
}

#[tokio::test]
async fn second_bind_on_the_same_port_fails() {
    let server = start().await;
    let state = Arc::new(AppState::default());
    let config = ServerConfig {
        host: "127.0.0.1".to_owned(),
        port: server.addr.port(),
    };

    let result = TelemetryServer::bind(&config, state).await;
    assert!(matches!(result, Err(ServerError::Bind(_))));
}
