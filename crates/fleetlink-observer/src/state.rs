//! Shared application state for the Observer API server.
//!
//! The observer never touches the world. It reads snapshots that the
//! tick loop already published through the [`SnapshotBroadcaster`], so a
//! slow HTTP or `WebSocket` client cannot delay a tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleetlink_core::{SimulationControl, SnapshotBroadcaster};
use fleetlink_types::WorldSnapshot;
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Source of published snapshots.
    pub broadcaster: SnapshotBroadcaster,
    /// Stop signal; `WebSocket` streams and the server end with it.
    pub control: Arc<SimulationControl>,
    /// When the observer state was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state reading from `broadcaster`.
    pub fn new(broadcaster: SnapshotBroadcaster, control: Arc<SimulationControl>) -> Self {
        Self {
            broadcaster,
            control,
            started_at: Utc::now(),
        }
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        self.broadcaster.latest()
    }

    /// Subscribe to every future snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<WorldSnapshot>> {
        self.broadcaster.subscribe()
    }

    /// Page refresh period, matching the tick cadence.
    pub fn refresh_ms(&self) -> u64 {
        u64::try_from(self.control.tick_interval().as_millis()).unwrap_or(u64::MAX)
    }
}
