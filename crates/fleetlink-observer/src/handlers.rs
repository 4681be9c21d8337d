//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read the latest published snapshot from the shared
//! [`AppState`] and never lock the world.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | HTML status page with fleet map |
//! | `GET` | `/api/snapshot` | Latest world snapshot |
//! | `GET` | `/api/status` | Tick, uptime and per-state counts |
//! | `GET` | `/api/vehicles/{id}` | Single vehicle |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use chrono::Utc;
use fleetlink_types::{LinkState, ServerMessage, VehicleId};
use serde::Serialize;

use crate::error::ObserverError;
use crate::page;
use crate::state::AppState;

/// Response body for `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Tick of the latest snapshot.
    pub tick: u64,
    /// Number of vehicles in the fleet.
    pub vehicles: usize,
    /// Vehicles with any working data path.
    pub streaming: usize,
    /// Vehicle count per link state.
    pub states: Vec<StateCount>,
    /// Live push subscribers (sessions and `WebSocket` viewers).
    pub subscribers: usize,
    /// Observer start time (RFC 3339).
    pub started_at: String,
    /// Seconds since the observer started.
    pub uptime_seconds: i64,
}

/// Number of vehicles in one link state.
#[derive(Debug, Serialize)]
pub struct StateCount {
    /// The link state.
    pub state: LinkState,
    /// Visualization color for the state.
    pub color: &'static str,
    /// Vehicles currently in the state.
    pub count: usize,
}

/// Response body for `GET /api/vehicles/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    /// Tick the data was captured at.
    pub tick: u64,
    /// Vehicle identifier.
    pub id: VehicleId,
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// Current link state.
    pub state: LinkState,
    /// Provider relayed through, if any.
    pub relay_target: Option<VehicleId>,
    /// Whether the vehicle has any working data path.
    pub is_streaming: bool,
    /// Visualization color for the state.
    pub color: &'static str,
}

/// Serve the HTML status page.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    Html(page::render_index(
        &snapshot,
        state.started_at,
        state.refresh_ms(),
    ))
}

/// Return the latest world snapshot in the broadcast wire shape.
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let message = ServerMessage::State((*state.snapshot()).clone());
    Ok(Json(serde_json::to_value(&message)?))
}

/// Return a summary of the simulation.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    let states = LinkState::ALL
        .iter()
        .map(|&s| StateCount {
            state: s,
            color: s.color(),
            count: snapshot.count_in(s),
        })
        .collect();

    Json(StatusResponse {
        tick: snapshot.tick,
        vehicles: snapshot.vehicles.len(),
        streaming: snapshot
            .vehicles
            .iter()
            .filter(|v| v.state.is_streaming())
            .count(),
        states,
        subscribers: state.broadcaster.subscriber_count(),
        started_at: state.started_at.to_rfc3339(),
        uptime_seconds: Utc::now()
            .signed_duration_since(state.started_at)
            .num_seconds(),
    })
}

/// Return one vehicle from the latest snapshot.
pub async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = id_str
        .parse::<u32>()
        .map(VehicleId)
        .map_err(|e| ObserverError::InvalidId(format!("{id_str}: {e}")))?;

    let snapshot = state.snapshot();
    let view = snapshot
        .vehicle(id)
        .ok_or_else(|| ObserverError::NotFound(format!("vehicle {}", id.into_inner())))?;

    Ok(Json(VehicleResponse {
        tick: snapshot.tick,
        id: view.id,
        x: view.x,
        y: view.y,
        state: view.state,
        relay_target: view.relay_target,
        is_streaming: view.state.is_streaming(),
        color: view.state.color(),
    }))
}
