//! Vehicle ownership across sessions.
//!
//! A [`VehiclePool`] tracks which vehicles are not controlled by any
//! session. [`VehiclePool::acquire`] hands out a [`VehicleLease`]; dropping
//! the lease returns the vehicle, so a session that ends for any reason
//! releases its vehicle without explicit cleanup.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fleetlink_types::VehicleId;
use tracing::debug;

use crate::error::SessionError;

/// Set of uncontrolled vehicles, shared by every session.
#[derive(Debug, Clone)]
pub struct VehiclePool {
    all: Arc<BTreeSet<VehicleId>>,
    free: Arc<Mutex<BTreeSet<VehicleId>>>,
}

impl VehiclePool {
    /// Create a pool in which every vehicle in `ids` is free.
    pub fn new(ids: impl IntoIterator<Item = VehicleId>) -> Self {
        let all: BTreeSet<VehicleId> = ids.into_iter().collect();
        Self {
            free: Arc::new(Mutex::new(all.clone())),
            all: Arc::new(all),
        }
    }

    /// Uncontrolled vehicles in ascending id order.
    pub fn available(&self) -> Vec<VehicleId> {
        self.lock_free().iter().copied().collect()
    }

    /// Whether every vehicle is controlled.
    pub fn is_exhausted(&self) -> bool {
        self.lock_free().is_empty()
    }

    /// Total number of vehicles, controlled or not.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Whether the pool has no vehicles at all.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Take control of a vehicle.
    ///
    /// With `Some(id)` that exact vehicle is leased; with `None` the
    /// lowest free id is.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::VehicleUnavailable`] if the requested
    /// vehicle is unknown or already controlled, and
    /// [`SessionError::NoVehicleAvailable`] if no vehicle is free.
    pub fn acquire(&self, requested: Option<VehicleId>) -> Result<VehicleLease, SessionError> {
        let (id, remaining) = {
            let mut free = self.lock_free();
            let id = match requested {
                Some(id) => {
                    if !free.remove(&id) {
                        return Err(SessionError::VehicleUnavailable(id));
                    }
                    id
                }
                None => free.pop_first().ok_or(SessionError::NoVehicleAvailable)?,
            };
            (id, free.len())
        };
        debug!(vehicle_id = %id, remaining, "Vehicle leased");
        Ok(VehicleLease {
            id,
            free: Arc::clone(&self.free),
        })
    }

    fn lock_free(&self) -> MutexGuard<'_, BTreeSet<VehicleId>> {
        // The set is always left consistent, so a poisoned lock is usable.
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive control of one vehicle, released on drop.
#[derive(Debug)]
pub struct VehicleLease {
    id: VehicleId,
    free: Arc<Mutex<BTreeSet<VehicleId>>>,
}

impl VehicleLease {
    /// The controlled vehicle.
    pub const fn id(&self) -> VehicleId {
        self.id
    }
}

impl Drop for VehicleLease {
    fn drop(&mut self) {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.id);
        debug!(vehicle_id = %self.id, "Vehicle released");
    }
}
