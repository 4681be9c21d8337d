//! Observer HTTP server lifecycle management.
//!
//! [`bind`] opens the listening socket and [`serve`] runs the Axum server
//! on it until the simulation stops. [`start_server`] does both.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the Observer server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

/// Errors that can occur when starting or running the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Bind the observer's listening socket.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or cannot be bound.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve the Observer API on an already bound listener.
///
/// Shuts down gracefully once the simulation's stop signal fires.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    info!(addr = ?addr, "Observer server listening");

    let control = Arc::clone(&state.control);
    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { control.stopped().await })
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    info!("Observer server stopped");
    Ok(())
}

/// Start the Observer HTTP server and run it until the simulation stops.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve(listener, state).await
}
