//! Vehicle model and the decentralized link-selection rule.
//!
//! Each vehicle picks its own network technology from what it can observe
//! locally: its own capabilities and the positions and provider status of
//! the other vehicles. Rules are evaluated in strict priority order:
//!
//! 1. [`LinkState::ProviderLink`] -- the vehicle has its own uplink.
//! 2. [`LinkState::RelayedLink`] -- a provider lies within the vehicle's
//!    DSRC range. The nearest provider wins; exact distance ties go to
//!    the lowest id.
//! 3. [`LinkState::CellularLink`] -- the vehicle has cellular.
//! 4. [`LinkState::NoService`] -- otherwise.
//!
//! Selection runs in two passes over one snapshot. Pass 1 marks providers
//! from capabilities alone; pass 2 resolves every other vehicle against the
//! pass-1 providers only, so a relay never points at another relay.

use fleetlink_types::{Capabilities, LinkState, Position, VehicleId, VehicleView};

/// A vehicle in the world.
///
/// `state` and `relay_target` are derived values owned by the tick; they
/// are only written through [`Vehicle::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Stable identifier.
    pub id: VehicleId,
    /// Current position, changed only by accepted moves.
    pub position: Position,
    /// Hardware capabilities.
    pub capabilities: Capabilities,
    /// Maximum DSRC relay distance.
    pub range: f64,
    state: LinkState,
    relay_target: Option<VehicleId>,
}

/// Outcome of the selection rule for one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkDecision {
    /// Selected link state.
    pub state: LinkState,
    /// Provider relayed through; `Some` iff `state` is `RelayedLink`.
    pub relay_target: Option<VehicleId>,
}

impl LinkDecision {
    /// Decision for a vehicle with its own uplink.
    pub const PROVIDER: Self = Self {
        state: LinkState::ProviderLink,
        relay_target: None,
    };

    /// Decision for a vehicle relaying through `provider`.
    pub const fn relayed(provider: VehicleId) -> Self {
        Self {
            state: LinkState::RelayedLink,
            relay_target: Some(provider),
        }
    }

    /// Decision for a vehicle with neither uplink nor relay.
    pub const fn fallback(cellular: bool) -> Self {
        Self {
            state: if cellular {
                LinkState::CellularLink
            } else {
                LinkState::NoService
            },
            relay_target: None,
        }
    }
}

impl Vehicle {
    /// Create a vehicle. Its link state stays [`LinkState::NoService`]
    /// until the first selection pass.
    pub const fn new(
        id: VehicleId,
        position: Position,
        capabilities: Capabilities,
        range: f64,
    ) -> Self {
        Self {
            id,
            position,
            capabilities,
            range,
            state: LinkState::NoService,
            relay_target: None,
        }
    }

    /// Link state from the latest selection pass.
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Relay provider from the latest selection pass.
    pub const fn relay_target(&self) -> Option<VehicleId> {
        self.relay_target
    }

    /// Store the result of a selection pass.
    pub const fn apply(&mut self, decision: LinkDecision) {
        self.state = decision.state;
        self.relay_target = decision.relay_target;
    }

    /// Public projection used in snapshots.
    pub const fn view(&self) -> VehicleView {
        VehicleView {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            state: self.state,
            relay_target: self.relay_target,
        }
    }
}

/// A pass-1 provider: id and position.
#[derive(Debug, Clone, Copy)]
struct Provider {
    id: VehicleId,
    position: Position,
}

/// Run both selection passes over `vehicles`.
///
/// Returns one decision per input vehicle, in input order. The result only
/// depends on ids, positions, capabilities and ranges; previous link states
/// are ignored.
pub fn select_links(vehicles: &[Vehicle]) -> Vec<LinkDecision> {
    // Pass 1: providers come from capabilities alone.
    let providers: Vec<Provider> = vehicles
        .iter()
        .filter(|v| v.capabilities.own_uplink)
        .map(|v| Provider {
            id: v.id,
            position: v.position,
        })
        .collect();

    // Pass 2: everyone else resolves against pass-1 providers.
    vehicles.iter().map(|v| decide(v, &providers)).collect()
}

fn decide(vehicle: &Vehicle, providers: &[Provider]) -> LinkDecision {
    if vehicle.capabilities.own_uplink {
        return LinkDecision::PROVIDER;
    }

    match nearest_provider(vehicle, providers) {
        Some(provider) => LinkDecision::relayed(provider),
        None => LinkDecision::fallback(vehicle.capabilities.cellular),
    }
}

/// Closest provider within `vehicle.range`, ties broken by lowest id.
fn nearest_provider(vehicle: &Vehicle, providers: &[Provider]) -> Option<VehicleId> {
    providers
        .iter()
        .filter(|p| p.id != vehicle.id)
        .map(|p| (vehicle.position.distance_to(p.position), p.id))
        .filter(|(distance, _)| *distance <= vehicle.range)
        .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}
