//! Snapshot fan-out to sessions and visualizations.
//!
//! [`SnapshotBroadcaster`] is the tick loop's [`TickCallback`]. Each
//! published snapshot goes two ways:
//!
//! - a [`broadcast`] channel for push subscribers (client sessions,
//!   `WebSocket` viewers). Sending never waits on a receiver; a subscriber
//!   that falls more than the channel capacity behind gets
//!   [`broadcast::error::RecvError::Lagged`] and skips to the newest
//!   snapshot.
//! - a [`watch`] cell holding only the latest snapshot for pull-based
//!   readers.
//!
//! [`TickCallback`]: crate::runner::TickCallback

use std::sync::Arc;

use fleetlink_types::WorldSnapshot;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::runner::TickCallback;

/// Default capacity of the snapshot broadcast channel.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Publishes world snapshots to every subscriber.
#[derive(Debug, Clone)]
pub struct SnapshotBroadcaster {
    tx: broadcast::Sender<Arc<WorldSnapshot>>,
    latest: Arc<watch::Sender<Arc<WorldSnapshot>>>,
}

impl SnapshotBroadcaster {
    /// Create a broadcaster seeded with `initial` as the latest snapshot.
    ///
    /// A zero `capacity` is raised to 1.
    pub fn new(capacity: usize, initial: Arc<WorldSnapshot>) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        let (latest, _) = watch::channel(initial);
        Self {
            tx,
            latest: Arc::new(latest),
        }
    }

    /// Publish a snapshot.
    ///
    /// Returns the number of push subscribers that will receive it. Zero
    /// subscribers is not an error.
    pub fn publish(&self, snapshot: Arc<WorldSnapshot>) -> usize {
        self.latest.send_replace(Arc::clone(&snapshot));
        // send only fails when nobody is subscribed.
        self.tx.send(snapshot).unwrap_or(0)
    }

    /// Subscribe to every future snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<WorldSnapshot>> {
        self.tx.subscribe()
    }

    /// Watch the latest snapshot without receiving each one.
    pub fn watch(&self) -> watch::Receiver<Arc<WorldSnapshot>> {
        self.latest.subscribe()
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.latest.borrow())
    }

    /// Number of live push subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl TickCallback for SnapshotBroadcaster {
    fn on_tick(&mut self, snapshot: &Arc<WorldSnapshot>) {
        let receivers = self.publish(Arc::clone(snapshot));
        debug!(tick = snapshot.tick, receivers, "Snapshot broadcast sent");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    use super::*;

    fn snap(tick: u64) -> Arc<WorldSnapshot> {
        Arc::new(WorldSnapshot {
            tick,
            vehicles: Vec::new(),
        })
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let hub = SnapshotBroadcaster::new(4, snap(0));
        assert_eq!(hub.publish(snap(1)), 0);
        assert_eq!(hub.latest().tick, 1);
    }

    #[tokio::test]
    async fn every_subscriber_receives_each_snapshot() {
        let hub = SnapshotBroadcaster::new(4, snap(0));
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.publish(snap(1)), 2);
        assert_eq!(a.recv().await.unwrap().tick, 1);
        assert_eq!(b.recv().await.unwrap().tick, 1);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_without_blocking_others() {
        let hub = SnapshotBroadcaster::new(2, snap(0));
        let mut slow = hub.subscribe();
        let mut fast = hub.subscribe();

        for tick in 1..=5 {
            hub.publish(snap(tick));
            assert_eq!(fast.recv().await.unwrap().tick, tick);
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(slow.recv().await.unwrap().tick, 4);
        assert_eq!(slow.recv().await.unwrap().tick, 5);
        assert!(matches!(slow.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_affect_publishing() {
        let hub = SnapshotBroadcaster::new(4, snap(0));
        let gone = hub.subscribe();
        let mut kept = hub.subscribe();
        drop(gone);
        assert_eq!(hub.publish(snap(1)), 1);
        assert_eq!(kept.recv().await.unwrap().tick, 1);
    }

    #[tokio::test]
    async fn watch_sees_latest_only() {
        let mut hub = SnapshotBroadcaster::new(4, snap(0));
        let mut rx = hub.watch();
        hub.on_tick(&snap(1));
        hub.on_tick(&snap(2));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().tick, 2);
    }
}
