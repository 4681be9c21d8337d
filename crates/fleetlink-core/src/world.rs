//! Authoritative world state and its synchronization boundary.
//!
//! [`World`] owns every [`Vehicle`] plus the tick counter. Moves only touch
//! positions; link states are recomputed for the whole fleet on each
//! [`World::tick`] from one consistent view and published as an immutable
//! [`WorldSnapshot`].
//!
//! [`WorldHandle`] is the only way other tasks reach the world. Every read
//! and write goes through one [`tokio::sync::Mutex`], and each critical
//! section is a copy-in (move) or copy-out (snapshot), so readers never see
//! a partially updated tick.

use std::sync::Arc;

use fleetlink_types::{Capabilities, Position, VehicleId, WorldSnapshot};
use tokio::sync::Mutex;
use tracing::debug;

use crate::vehicle::{self, Vehicle};

/// Errors that can occur during world operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// No vehicle with this id exists.
    #[error("unknown vehicle: {0}")]
    UnknownVehicle(VehicleId),

    /// Two vehicles were created with the same id.
    #[error("duplicate vehicle id: {0}")]
    DuplicateVehicle(VehicleId),

    /// A position had a NaN or infinite coordinate.
    #[error("invalid position {position} for vehicle {vehicle}")]
    InvalidPosition {
        /// The vehicle being placed.
        vehicle: VehicleId,
        /// The rejected position.
        position: Position,
    },

    /// A relay range was negative, NaN or infinite.
    #[error("invalid range {range} for vehicle {vehicle}")]
    InvalidRange {
        /// The vehicle being created.
        vehicle: VehicleId,
        /// The rejected range.
        range: f64,
    },

    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// The vehicle collection and tick counter.
#[derive(Debug, Clone)]
pub struct World {
    /// All vehicles, sorted by id.
    vehicles: Vec<Vehicle>,
    /// Number of completed ticks.
    tick: u64,
    /// Snapshot captured at the end of the latest tick.
    published: Arc<WorldSnapshot>,
}

impl World {
    /// Build a world from its initial fleet.
    ///
    /// Link states are computed immediately so the tick-0 snapshot is
    /// already consistent.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateVehicle`] if two vehicles share an id,
    /// [`WorldError::InvalidPosition`] for non-finite coordinates, or
    /// [`WorldError::InvalidRange`] for a negative or non-finite range.
    pub fn new(mut vehicles: Vec<Vehicle>) -> Result<Self, WorldError> {
        vehicles.sort_by_key(|v| v.id);
        for pair in vehicles.windows(2) {
            if let [a, b] = pair
                && a.id == b.id
            {
                return Err(WorldError::DuplicateVehicle(a.id));
            }
        }
        for v in &vehicles {
            if !v.position.is_finite() {
                return Err(WorldError::InvalidPosition {
                    vehicle: v.id,
                    position: v.position,
                });
            }
            if !v.range.is_finite() || v.range < 0.0 {
                return Err(WorldError::InvalidRange {
                    vehicle: v.id,
                    range: v.range,
                });
            }
        }

        let mut world = Self {
            vehicles,
            tick: 0,
            published: Arc::new(WorldSnapshot::default()),
        };
        world.recompute();
        Ok(world)
    }

    /// Move a vehicle. The new position takes part in selection from the
    /// next tick on; link states are not touched here.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownVehicle`] if the id is absent, or
    /// [`WorldError::InvalidPosition`] for non-finite coordinates.
    pub fn apply_move(&mut self, id: VehicleId, position: Position) -> Result<(), WorldError> {
        if !position.is_finite() {
            return Err(WorldError::InvalidPosition {
                vehicle: id,
                position,
            });
        }
        let vehicle = self.vehicle_mut(id)?;
        vehicle.position = position;
        Ok(())
    }

    /// Replace a vehicle's capability flags. Takes effect on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownVehicle`] if the id is absent.
    pub fn set_capabilities(
        &mut self,
        id: VehicleId,
        capabilities: Capabilities,
    ) -> Result<(), WorldError> {
        self.vehicle_mut(id)?.capabilities = capabilities;
        Ok(())
    }

    /// Advance one tick: recompute every vehicle's link from the current
    /// positions and capabilities, then publish the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TickOverflow`] if the counter is exhausted.
    pub fn tick(&mut self) -> Result<Arc<WorldSnapshot>, WorldError> {
        self.tick = self.tick.checked_add(1).ok_or(WorldError::TickOverflow)?;
        self.recompute();
        debug!(tick = self.tick, vehicles = self.vehicles.len(), "World tick computed");
        Ok(Arc::clone(&self.published))
    }

    /// Snapshot published by the latest completed tick.
    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.published)
    }

    /// Number of completed ticks.
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// All vehicle ids in ascending order.
    pub fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.vehicles.iter().map(|v| v.id).collect()
    }

    /// Look up a vehicle by id.
    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    /// Number of vehicles.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether the world has no vehicles.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    fn vehicle_mut(&mut self, id: VehicleId) -> Result<&mut Vehicle, WorldError> {
        self.vehicles
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(WorldError::UnknownVehicle(id))
    }

    fn recompute(&mut self) {
        let decisions = vehicle::select_links(&self.vehicles);
        for (v, decision) in self.vehicles.iter_mut().zip(decisions) {
            v.apply(decision);
        }
        self.published = Arc::new(WorldSnapshot {
            tick: self.tick,
            vehicles: self.vehicles.iter().map(Vehicle::view).collect(),
        });
    }
}

/// Shared, cloneable access to the [`World`].
///
/// All operations lock the same mutex for a short copy-in or copy-out and
/// release it before returning.
#[derive(Debug, Clone)]
pub struct WorldHandle {
    inner: Arc<Mutex<World>>,
}

impl WorldHandle {
    /// Wrap a world for shared use.
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    /// See [`World::apply_move`].
    ///
    /// # Errors
    ///
    /// Propagates [`World::apply_move`] errors.
    pub async fn apply_move(&self, id: VehicleId, position: Position) -> Result<(), WorldError> {
        self.inner.lock().await.apply_move(id, position)
    }

    /// See [`World::set_capabilities`].
    ///
    /// # Errors
    ///
    /// Propagates [`World::set_capabilities`] errors.
    pub async fn set_capabilities(
        &self,
        id: VehicleId,
        capabilities: Capabilities,
    ) -> Result<(), WorldError> {
        self.inner.lock().await.set_capabilities(id, capabilities)
    }

    /// See [`World::tick`].
    ///
    /// # Errors
    ///
    /// Propagates [`World::tick`] errors.
    pub async fn tick(&self) -> Result<Arc<WorldSnapshot>, WorldError> {
        self.inner.lock().await.tick()
    }

    /// See [`World::snapshot`].
    pub async fn snapshot(&self) -> Arc<WorldSnapshot> {
        self.inner.lock().await.snapshot()
    }

    /// See [`World::vehicle_ids`].
    pub async fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.inner.lock().await.vehicle_ids()
    }
}
