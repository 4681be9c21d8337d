//! Core data structs shared by the engine, the session server, the
//! observer and the client.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::LinkState;
use crate::ids::VehicleId;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point on the simulation plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether both coordinates are finite (neither NaN nor infinite).
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Vehicle capabilities
// ---------------------------------------------------------------------------

/// Fixed hardware capabilities of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// The vehicle carries its own free high-bandwidth source.
    pub own_uplink: bool,
    /// The vehicle can fall back to paid cellular data.
    pub cellular: bool,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Public view of one vehicle inside a [`WorldSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct VehicleView {
    /// Vehicle identifier.
    pub id: VehicleId,
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// Link state computed at the snapshot's tick.
    pub state: LinkState,
    /// Provider this vehicle relays through, set only for
    /// [`LinkState::RelayedLink`].
    pub relay_target: Option<VehicleId>,
}

impl VehicleView {
    /// Position of the vehicle.
    pub const fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Where the vehicle's data comes from, for status displays:
    /// `via Vehicle N` when relayed, `via Cellular` on cellular, and
    /// `None` otherwise.
    pub fn source_description(&self) -> Option<String> {
        match (self.state, self.relay_target) {
            (LinkState::RelayedLink, Some(target)) => Some(format!("via Vehicle {}", target.0)),
            (LinkState::CellularLink, _) => Some(String::from("via Cellular")),
            _ => None,
        }
    }
}

/// Immutable copy of the whole fleet taken at the end of one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldSnapshot {
    /// Tick at which the snapshot was captured.
    pub tick: u64,
    /// All vehicles, ordered by id.
    pub vehicles: Vec<VehicleView>,
}

impl WorldSnapshot {
    /// Look up a single vehicle by id.
    pub fn vehicle(&self, id: VehicleId) -> Option<&VehicleView> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    /// Count vehicles in the given state.
    pub fn count_in(&self, state: LinkState) -> usize {
        self.vehicles.iter().filter(|v| v.state == state).count()
    }
}

/// A vehicle offered to a newly connected client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvailableVehicle {
    /// Vehicle identifier.
    pub id: VehicleId,
    /// Horizontal coordinate at the time of the offer.
    pub x: f64,
    /// Vertical coordinate at the time of the offer.
    pub y: f64,
}
