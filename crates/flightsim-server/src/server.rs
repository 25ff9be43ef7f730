//! Telemetry server lifecycle management.
//!
//! [`TelemetryServer::bind`] claims the TCP port up front so a busy port is
//! reported before anything else starts. [`TelemetryServer::serve`] then
//! runs until the given shutdown future resolves.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use flightsim_core::config::ListenConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the telemetry server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on. `0` picks a free port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ListenConfig::default())
    }
}

impl From<&ListenConfig> for ServerConfig {
    fn from(listen: &ListenConfig) -> Self {
        Self {
            host: listen.host.clone(),
            port: listen.port,
        }
    }
}

/// A bound, not yet serving, telemetry server.
pub struct TelemetryServer {
    listener: TcpListener,
    router: Router,
    state: Arc<AppState>,
}

impl TelemetryServer {
    /// Bind the listening socket and build the router.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is invalid or the port
    /// cannot be bound.
    pub async fn bind(config: &ServerConfig, state: Arc<AppState>) -> Result<Self, ServerError> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

        let router = build_router(Arc::clone(&state));

        Ok(Self {
            listener,
            router,
            state,
        })
    }

    /// The address actually bound (resolves port `0`).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::Bind(format!("local address unavailable: {e}")))
    }

    /// Serve requests until `shutdown` resolves.
    ///
    /// When `shutdown` resolves every streaming session is signalled to
    /// stop, then the server stops accepting connections.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(%addr, "Telemetry server listening");

        let state = self.state;
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                state.shutdown();
            })
            .await
            .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

        info!(%addr, "Telemetry server stopped");
        Ok(())
    }
}

/// Errors that can occur when starting or running the telemetry server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
