//! Enumeration types for the Fleetlink simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The network technology a vehicle is currently using.
///
/// Derived every tick from the fleet snapshot; clients never set it. The
/// variant names are the wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum LinkState {
    /// Streaming through the vehicle's own free uplink (e.g. onboard WiFi).
    ProviderLink,
    /// Streaming over DSRC through a nearby provider vehicle.
    RelayedLink,
    /// Streaming over paid cellular data.
    CellularLink,
    /// Not streaming.
    NoService,
}

impl LinkState {
    /// All states in priority order.
    pub const ALL: [Self; 4] = [
        Self::ProviderLink,
        Self::RelayedLink,
        Self::CellularLink,
        Self::NoService,
    ];

    /// Whether the vehicle has any working data path.
    pub const fn is_streaming(self) -> bool {
        !matches!(self, Self::NoService)
    }

    /// Display color used by visualizations.
    pub const fn color(self) -> &'static str {
        match self {
            Self::ProviderLink => "#2ecc71",
            Self::RelayedLink => "#3498db",
            Self::CellularLink => "#e67e22",
            Self::NoService => "#e74c3c",
        }
    }

    /// Short human-readable legend label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProviderLink => "WiFi source",
            Self::RelayedLink => "DSRC relay",
            Self::CellularLink => "Cellular",
            Self::NoService => "Not streaming",
        }
    }
}

impl core::fmt::Display for LinkState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::ProviderLink => "ProviderLink",
            Self::RelayedLink => "RelayedLink",
            Self::CellularLink => "CellularLink",
            Self::NoService => "NoService",
        };
        f.write_str(name)
    }
}
