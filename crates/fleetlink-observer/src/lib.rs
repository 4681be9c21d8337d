//! Observer API server for the Fleetlink simulation.
//!
//! This is the visualization collaborator. It exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/state`) streaming every tick's
//!   snapshot in the same shape controller sessions receive
//! - **REST endpoints** for the latest snapshot, a summary, and single
//!   vehicles
//! - **HTML status page** (`GET /`) drawing each vehicle in its state's
//!   color with an edge for every relay link
//!
//! # Architecture
//!
//! The observer only reads snapshots the tick loop has already published
//! through the [`SnapshotBroadcaster`]. It never locks the world, so no
//! HTTP client can delay a tick.
//!
//! [`SnapshotBroadcaster`]: fleetlink_core::SnapshotBroadcaster

pub mod error;
pub mod handlers;
pub mod page;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{ObserverHandle, StartupError, spawn_observer};
pub use state::AppState;
