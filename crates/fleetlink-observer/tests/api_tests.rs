//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use fleetlink_core::{FleetConfig, SimulationControl, SnapshotBroadcaster, World};
use fleetlink_observer::router::build_router;
use fleetlink_observer::state::AppState;
use fleetlink_types::WorldSnapshot;
use serde_json::Value;
use tower::ServiceExt;

/// Observer state over the demonstration fleet after one tick.
fn make_test_state() -> Arc<AppState> {
    let mut world = World::new(FleetConfig::default().build_vehicles()).unwrap();
    let broadcaster = SnapshotBroadcaster::new(8, world.snapshot());
    broadcaster.publish(world.tick().unwrap());
    Arc::new(AppState::new(
        broadcaster,
        Arc::new(SimulationControl::new(500, 0)),
    ))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: Arc<AppState>, uri: &str) -> axum::response::Response {
    build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_index_returns_html() {
    let response = get(make_test_state(), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Fleetlink Observer"));
    assert!(html.contains("#2ecc71"));
}

#[tokio::test]
async fn test_get_snapshot_uses_broadcast_shape() {
    let response = get(make_test_state(), "/api/snapshot").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["type"], "state");
    assert_eq!(json["tick"], 1);
    assert_eq!(json["vehicles"].as_array().unwrap().len(), 6);
    assert_eq!(json["vehicles"][0]["state"], "RelayedLink");
    assert_eq!(json["vehicles"][0]["relayTarget"], 1);
    assert_eq!(json["vehicles"][1]["state"], "ProviderLink");
    assert!(json["vehicles"][1]["relayTarget"].is_null());
}

#[tokio::test]
async fn test_snapshot_follows_latest_publish() {
    let state = make_test_state();
    state.broadcaster.publish(Arc::new(WorldSnapshot {
        tick: 99,
        vehicles: Vec::new(),
    }));

    let json = body_to_json(get(state, "/api/snapshot").await.into_body()).await;
    assert_eq!(json["tick"], 99);
}

#[tokio::test]
async fn test_get_status() {
    let response = get(make_test_state(), "/api/status").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["tick"], 1);
    assert_eq!(json["vehicles"], 6);
    assert_eq!(json["streaming"], 6);
    assert_eq!(json["states"][0]["state"], "ProviderLink");
    assert_eq!(json["states"][0]["count"], 2);
    assert_eq!(json["states"][1]["count"], 4);
    assert!(json["started_at"].is_string());
}

#[tokio::test]
async fn test_get_vehicle() {
    let response = get(make_test_state(), "/api/vehicles/4").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], 4);
    assert_eq!(json["state"], "RelayedLink");
    assert_eq!(json["relayTarget"], 5);
    assert_eq!(json["isStreaming"], true);
    assert_eq!(json["color"], "#3498db");
}

#[tokio::test]
async fn test_get_vehicle_not_found() {
    let response = get(make_test_state(), "/api/vehicles/42").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
    assert!(json["error"].as_str().unwrap().contains("42"));
}

#[tokio::test]
async fn test_get_vehicle_invalid_id() {
    let response = get(make_test_state(), "/api/vehicles/abc").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = get(make_test_state(), "/api/nothing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
