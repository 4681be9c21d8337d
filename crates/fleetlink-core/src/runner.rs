//! Fixed-period tick loop.
//!
//! [`run_simulation`] drives [`WorldHandle::tick`] on a
//! [`tokio::time::interval`], independent of command arrival. After each
//! tick the [`TickCallback`] receives the freshly published snapshot,
//! outside the world lock, so a slow consumer never holds up sessions.
//!
//! The loop ends when the configured tick limit is reached or when a stop
//! is requested through [`SimulationControl`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fleetlink_types::WorldSnapshot;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::world::{WorldError, WorldHandle};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// Reason why the simulation loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// A stop was requested (e.g. Ctrl-C).
    StopRequested,
}

/// Result of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Why the loop ended.
    pub end_reason: SimulationEndReason,
    /// Number of ticks executed by this run.
    pub total_ticks: u64,
    /// The last snapshot published, if any tick ran.
    pub final_snapshot: Option<Arc<WorldSnapshot>>,
}

/// Shared run control for the tick loop and everything that must stop
/// with it.
#[derive(Debug)]
pub struct SimulationControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,
    /// Wakes tasks waiting in [`SimulationControl::stopped`].
    stop_notify: Notify,
    /// Tick period in milliseconds.
    tick_interval_ms: u64,
    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,
}

impl SimulationControl {
    /// Create run control with the given period and tick limit.
    pub fn new(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            tick_interval_ms,
            max_ticks,
        }
    }

    /// Request a clean stop and wake every waiter.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested. Returns immediately if it already was.
    pub async fn stopped(&self) {
        loop {
            // Register before checking so a concurrent request_stop is not lost.
            let notified = self.stop_notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    /// Tick period (at least 1ms).
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Returns `true` if `max_ticks > 0` and `tick >= max_ticks`.
    pub const fn tick_limit_reached(&self, tick: u64) -> bool {
        self.max_ticks > 0 && tick >= self.max_ticks
    }
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called with the snapshot published by the tick.
    fn on_tick(&mut self, snapshot: &Arc<WorldSnapshot>);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _snapshot: &Arc<WorldSnapshot>) {}
}

/// Run the tick loop until the tick limit or a stop request.
///
/// The first tick runs immediately, later ones every
/// [`SimulationControl::tick_interval`]. Late ticks are delayed rather
/// than bunched.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails.
pub async fn run_simulation(
    world: &WorldHandle,
    control: &Arc<SimulationControl>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut total_ticks: u64 = 0;
    let mut last: Option<Arc<WorldSnapshot>> = None;

    let mut interval = tokio::time::interval(control.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        tick_interval_ms = control.tick_interval().as_millis(),
        max_ticks = control.max_ticks(),
        "Simulation starting"
    );

    loop {
        tokio::select! {
            biased;
            () = control.stopped() => {
                info!("Stop requested");
                return Ok(SimulationResult {
                    end_reason: SimulationEndReason::StopRequested,
                    total_ticks,
                    final_snapshot: last,
                });
            }
            _ = interval.tick() => {}
        }

        let snapshot = world.tick().await?;
        total_ticks = total_ticks.saturating_add(1);

        callback.on_tick(&snapshot);

        if control.tick_limit_reached(snapshot.tick) {
            info!(
                tick = snapshot.tick,
                max_ticks = control.max_ticks(),
                "Tick limit reached"
            );
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::MaxTicksReached,
                total_ticks,
                final_snapshot: Some(snapshot),
            });
        }

        last = Some(snapshot);
    }
}

/// Log the end of a simulation run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_snapshot.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if result.final_snapshot.is_none() {
        warn!("Simulation ended with no ticks executed");
    }
}
