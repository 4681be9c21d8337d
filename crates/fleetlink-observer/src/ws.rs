//! `WebSocket` handler for real-time snapshot streaming.
//!
//! Clients connect to `GET /ws/state` and receive one
//! `{"type":"state","tick":..,"vehicles":[..]}` text frame per tick, the
//! same shape controller sessions receive. If a client falls behind,
//! lagged snapshots are skipped and it resumes from the newest one. The
//! stream ends when the simulation stops.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use fleetlink_types::WorldSnapshot;
use fleetlink_types::protocol::{self, ServerMessage};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming snapshots.
///
/// # Route
///
/// `GET /ws/state`
pub async fn ws_state(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut rx = state.subscribe();

    // Start with the latest snapshot so the viewer does not wait a tick.
    if send_snapshot(&mut socket, &state.snapshot()).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            () = state.control.stopped() => {
                debug!("Simulation stopped, closing WebSocket");
                if let Err(e) = socket.send(Message::Close(None)).await {
                    debug!(error = %e, "WebSocket close frame not delivered");
                }
                return;
            }
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        if send_snapshot(&mut socket, &snapshot).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Send one snapshot. An `Err` means the client is gone.
async fn send_snapshot(socket: &mut WebSocket, snapshot: &WorldSnapshot) -> Result<(), ()> {
    let json = match protocol::encode_message(&ServerMessage::State(snapshot.clone())) {
        Ok(j) => j,
        Err(e) => {
            // A snapshot that cannot be encoded is skipped, not fatal.
            warn!("Failed to serialize snapshot: {e}");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|e| {
        debug!(error = %e, "WebSocket client disconnected (send failed)");
    })
}
