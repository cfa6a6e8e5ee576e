//! Vehicle registry - canonical vehicle state and bounded location history.
//!
//! The registry is the single source of truth for vehicle state. Each
//! vehicle carries a time-ordered history of location samples capped at a
//! configured capacity; the oldest sample is evicted on overflow, enforced
//! on every append.
//!
//! # Design
//!
//! - The registry never starts or stops timers. `set_mode` touches mode
//!   only; a caller moving a vehicle out of `Active` must stop tracking
//!   separately. This keeps the dependency arrow pointing one way:
//!   tracking depends on the registry, never the reverse.
//! - Interior locking uses a `parking_lot::RwLock`. Reads snapshot and
//!   release; the tick path (append + classify inputs) runs under a single
//!   write-lock acquisition so one vehicle's tick observes consistent
//!   state.
//! - `find_nearby` is a linear scan over the vehicle map. Fine at fleet
//!   scale (hundreds of vehicles); an index would only pay off well beyond
//!   that.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use parking_lot::RwLock;

use crate::geo::{haversine_distance_km, GeoPoint};
use crate::model::{LocationSample, RouteId, Vehicle, VehicleId, VehicleMode};

/// Errors returned by registry lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The vehicle id is not registered.
    NotFound(VehicleId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound(id) => write!(f, "unknown vehicle: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Consistent view of one vehicle taken at append time.
///
/// Produced under the same lock acquisition as the append itself, so the
/// classifier sees exactly the state the append produced.
#[derive(Debug, Clone)]
pub struct TickSnapshot {
    /// Vehicle state after the append.
    pub vehicle: Vehicle,
    /// The sample just appended.
    pub latest: LocationSample,
    /// The sample immediately before it, if any.
    pub previous: Option<LocationSample>,
}

/// Per-vehicle record: state plus bounded history.
#[derive(Debug)]
struct VehicleRecord {
    vehicle: Vehicle,
    /// Time-ordered samples, oldest first.
    history: VecDeque<LocationSample>,
}

/// Canonical vehicle state with bounded per-vehicle location history.
#[derive(Debug)]
pub struct VehicleRegistry {
    history_capacity: usize,
    inner: RwLock<HashMap<VehicleId, VehicleRecord>>,
}

impl VehicleRegistry {
    /// Create an empty registry with the given per-vehicle history capacity.
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history_capacity,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Register a vehicle. Idempotent upsert: registering an existing id
    /// replaces the vehicle state but preserves its accumulated history.
    pub fn register(&self, vehicle: Vehicle) {
        let mut inner = self.inner.write();
        match inner.get_mut(&vehicle.id) {
            Some(record) => record.vehicle = vehicle,
            None => {
                let id = vehicle.id.clone();
                inner.insert(
                    id,
                    VehicleRecord {
                        vehicle,
                        history: VecDeque::with_capacity(self.history_capacity),
                    },
                );
            }
        }
    }

    /// Look up a vehicle by id.
    pub fn get(&self, id: &VehicleId) -> Result<Vehicle, RegistryError> {
        self.inner
            .read()
            .get(id)
            .map(|r| r.vehicle.clone())
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Snapshot of all registered vehicles. Order is unspecified.
    pub fn list(&self) -> Vec<Vehicle> {
        self.inner
            .read()
            .values()
            .map(|r| r.vehicle.clone())
            .collect()
    }

    /// Number of registered vehicles.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Update a vehicle's operating mode, returning the previous mode.
    ///
    /// Mode only: if the new mode is not `Active`, stopping tracking is the
    /// caller's responsibility.
    pub fn set_mode(
        &self,
        id: &VehicleId,
        mode: VehicleMode,
    ) -> Result<VehicleMode, RegistryError> {
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let previous = record.vehicle.mode;
        record.vehicle.mode = mode;
        Ok(previous)
    }

    /// Update a vehicle's route assignment.
    pub fn set_route(
        &self,
        id: &VehicleId,
        route: Option<RouteId>,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        record.vehicle.route = route;
        Ok(())
    }

    /// Append a sample to a vehicle's history.
    ///
    /// Evicts the oldest sample beyond capacity and updates the vehicle's
    /// latest-sample pointer. Returns a consistent snapshot (vehicle,
    /// latest, previous) taken under the same lock acquisition, for status
    /// classification.
    pub fn append_sample(
        &self,
        id: &VehicleId,
        sample: LocationSample,
    ) -> Result<TickSnapshot, RegistryError> {
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        let previous = record.history.back().cloned();
        record.history.push_back(sample.clone());
        while record.history.len() > self.history_capacity {
            record.history.pop_front();
        }
        record.vehicle.last_sample = Some(sample.clone());

        Ok(TickSnapshot {
            vehicle: record.vehicle.clone(),
            latest: sample,
            previous,
        })
    }

    /// A vehicle's history, oldest first.
    ///
    /// With `limit`, only the most recent `limit` samples are returned
    /// (still oldest first).
    pub fn history(
        &self,
        id: &VehicleId,
        limit: Option<usize>,
    ) -> Result<Vec<LocationSample>, RegistryError> {
        let inner = self.inner.read();
        let record = inner
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        let len = record.history.len();
        let skip = match limit {
            Some(limit) if limit < len => len - limit,
            _ => 0,
        };
        Ok(record.history.iter().skip(skip).cloned().collect())
    }

    /// Vehicles within `radius_km` of the query point.
    ///
    /// Only vehicles in `Active` mode with a known last sample participate.
    /// Linear scan over the registry.
    pub fn find_nearby(&self, center: GeoPoint, radius_km: f64) -> Vec<Vehicle> {
        self.inner
            .read()
            .values()
            .filter(|r| r.vehicle.mode == VehicleMode::Active)
            .filter(|r| {
                r.vehicle
                    .last_sample
                    .as_ref()
                    .map(|s| haversine_distance_km(center, s.position()) <= radius_km)
                    .unwrap_or(false)
            })
            .map(|r| r.vehicle.clone())
            .collect()
    }
}
