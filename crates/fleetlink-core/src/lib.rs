//! World state, link selection, and the tick loop for the Fleetlink simulation.
//!
//! Every tick the engine re-decides, for each vehicle, which network
//! technology it uses: its own uplink, a DSRC relay through a nearby
//! provider, cellular, or nothing. The outcome is published as an
//! immutable [`WorldSnapshot`] that sessions and observers share.
//!
//! # Modules
//!
//! - [`vehicle`] -- Per-vehicle record and the [`select_links`] decision.
//! - [`world`] -- The owned [`World`] and its shared [`WorldHandle`].
//! - [`broadcast`] -- [`SnapshotBroadcaster`] fan-out of published snapshots.
//! - [`runner`] -- Real-time tick loop with stop and tick-limit handling.
//! - [`config`] -- Loading `fleetlink-config.yaml` into typed structs.
//!
//! [`WorldSnapshot`]: fleetlink_types::WorldSnapshot
//! [`select_links`]: vehicle::select_links
//! [`World`]: world::World
//! [`WorldHandle`]: world::WorldHandle
//! [`SnapshotBroadcaster`]: broadcast::SnapshotBroadcaster

pub mod broadcast;
pub mod config;
pub mod runner;
pub mod vehicle;
pub mod world;

pub use broadcast::SnapshotBroadcaster;
pub use config::{ConfigError, FleetConfig};
pub use runner::{
    NoOpCallback, RunnerError, SimulationControl, SimulationEndReason, SimulationResult,
    TickCallback, run_simulation,
};
pub use vehicle::{LinkDecision, Vehicle, select_links};
pub use world::{World, WorldError, WorldHandle};
