//! Type-safe vehicle identifier.
//!
//! Vehicle identifiers are small integers assigned once when the fleet is
//! built and never reused. Their ordering is meaningful: it is the final
//! tie-break when a vehicle has two equally distant providers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Stable unique identifier of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VehicleId(pub u32);

impl VehicleId {
    /// Return the inner integer value.
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "V{}", self.0)
    }
}

impl From<u32> for VehicleId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<VehicleId> for u32 {
    fn from(id: VehicleId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_vehicle_prefix() {
        assert_eq!(VehicleId(3).to_string(), "V3");
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&VehicleId(7)).unwrap_or_default();
        assert_eq!(json, "7");
    }

    #[test]
    fn ordering_follows_inner_value() {
        assert!(VehicleId(1) < VehicleId(2));
    }
}
