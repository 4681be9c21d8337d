//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled so browser visualizations on other
//! origins can read the snapshot.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- HTML status page with fleet map
/// - `GET /ws/state` -- `WebSocket` snapshot stream
/// - `GET /api/snapshot` -- latest world snapshot
/// - `GET /api/status` -- simulation summary
/// - `GET /api/vehicles/{id}` -- single vehicle
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/state", get(ws::ws_state))
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/status", get(handlers::get_status))
        .route("/api/vehicles/{id}", get(handlers::get_vehicle))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
