//! Observer server startup helper for embedding in the engine.
//!
//! [`spawn_observer`] binds the socket eagerly, so a port conflict is
//! reported during engine startup, then serves on a background task that
//! runs concurrently with the tick loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A running observer.
#[derive(Debug)]
pub struct ObserverHandle {
    /// The bound address.
    pub addr: SocketAddr,
    /// The serving task; it finishes after the simulation stops.
    pub task: JoinHandle<()>,
}

/// Bind the Observer HTTP server and serve it on a background task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the server cannot bind to the
/// requested address.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<ObserverHandle, StartupError> {
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("local address unavailable: {e}")))?;

    let task = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%addr, "Observer server spawned on background task");

    Ok(ObserverHandle { addr, task })
}
