//! Shared type definitions for the Fleetlink simulation.
//!
//! This crate is the vocabulary shared by the engine, the session server,
//! the observer and the interactive client. Snapshot types are exported to
//! `TypeScript` via `ts-rs` for browser-based visualizations.
//!
//! # Modules
//!
//! - [`ids`] -- The [`VehicleId`] newtype
//! - [`enums`] -- [`LinkState`], the per-tick network technology choice
//! - [`structs`] -- Geometry, capabilities and world snapshots
//! - [`protocol`] -- Newline-delimited JSON wire protocol

pub mod enums;
pub mod ids;
pub mod protocol;
pub mod structs;

pub use enums::LinkState;
pub use ids::VehicleId;
pub use protocol::{ClientCommand, ErrorCode, ProtocolError, ServerMessage};
pub use structs::{AvailableVehicle, Capabilities, Position, VehicleView, WorldSnapshot};
