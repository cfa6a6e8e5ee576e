//! Fleet service - owned wiring of the engine's components.
//!
//! `FleetService` is the single entry point for a host application. It
//! constructs explicit, owned instances of the registry, event bus, sample
//! source, and tracker daemon - there is no ambient global state anywhere
//! in the engine - and exposes the full operation surface consumed by a
//! presentation layer.
//!
//! # Lifecycle
//!
//! ```ignore
//! use fleetpulse::service::FleetService;
//! use fleetpulse::config::FleetConfig;
//!
//! let service = FleetService::start(FleetConfig::default());
//! service.register_vehicles(fleet);
//! service.start_all().await?;
//!
//! // ... run ...
//!
//! service.shutdown().await; // joins the daemon and every timer
//! ```
//!
//! Shutdown is explicit and awaited: teardown cancels the master token and
//! joins the daemon, which in turn joins every ticker task. Nothing relies
//! on drop order or finalizers.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bus::{EventBus, EventCallback, SubscriberId};
use crate::config::FleetConfig;
use crate::geo::GeoPoint;
use crate::metrics::{compute_metrics, VehicleMetrics};
use crate::model::{
    EmergencyKind, LocationSample, RouteId, Vehicle, VehicleId, VehicleMode,
};
use crate::registry::{RegistryError, VehicleRegistry};
use crate::simulator::{RandomSampleSource, SampleSource};
use crate::tracking::{TrackerDaemon, TrackingError, TrackingService};

/// Owned engine instance: registry, bus, and tracker daemon.
pub struct FleetService {
    config: FleetConfig,
    registry: Arc<VehicleRegistry>,
    bus: Arc<EventBus>,
    tracking: TrackingService,
    daemon: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl FleetService {
    /// Start the engine with the default random sample source.
    ///
    /// Must be called from within a tokio runtime: the tracker daemon is
    /// spawned onto it.
    pub fn start(config: FleetConfig) -> Self {
        let source = Arc::new(RandomSampleSource::new(config.simulator.clone()));
        Self::start_with_source(config, source)
    }

    /// Start the engine with an injected sample source.
    ///
    /// Tests use this to substitute deterministic telemetry.
    pub fn start_with_source(config: FleetConfig, source: Arc<dyn SampleSource>) -> Self {
        let registry = Arc::new(VehicleRegistry::new(config.tracking.history_capacity));
        let bus = Arc::new(EventBus::new());

        let (daemon, tx) = TrackerDaemon::new(
            config.tracking.channel_capacity,
            Arc::clone(&registry),
            Arc::clone(&bus),
            source,
            config.classifier.clone(),
        );

        let shutdown = CancellationToken::new();
        let daemon = tokio::spawn(daemon.run(shutdown.clone()));

        info!(
            history_capacity = config.tracking.history_capacity,
            tick_period_ms = config.tracking.tick_period.as_millis() as u64,
            "fleet service started"
        );

        Self {
            tracking: TrackingService::new(tx, config.tracking.tick_period),
            config,
            registry,
            bus,
            daemon,
            shutdown,
        }
    }

    /// Stop the engine: cancels the daemon, which joins every live timer.
    ///
    /// After this returns, no task owned by the engine is running.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.daemon.await;
        info!("fleet service stopped");
    }

    // ------------------------------------------------------------------
    // Seeding and vehicle state
    // ------------------------------------------------------------------

    /// Bulk-seed the registry. Registering an existing id upserts it.
    pub fn register_vehicles(&self, vehicles: Vec<Vehicle>) {
        let count = vehicles.len();
        for vehicle in vehicles {
            self.registry.register(vehicle);
        }
        info!(count, total = self.registry.len(), "vehicles registered");
    }

    /// Look up one vehicle.
    pub fn get_vehicle(&self, id: &VehicleId) -> Result<Vehicle, RegistryError> {
        self.registry.get(id)
    }

    /// Snapshot of all vehicles. Order is unspecified.
    pub fn list_vehicles(&self) -> Vec<Vehicle> {
        self.registry.list()
    }

    /// A vehicle's sample history, oldest first; `limit` keeps only the
    /// most recent samples.
    pub fn get_history(
        &self,
        id: &VehicleId,
        limit: Option<usize>,
    ) -> Result<Vec<LocationSample>, RegistryError> {
        self.registry.history(id, limit)
    }

    /// Movement metrics recomputed from the vehicle's current history.
    pub fn get_metrics(&self, id: &VehicleId) -> Result<VehicleMetrics, RegistryError> {
        let history = self.registry.history(id, None)?;
        Ok(compute_metrics(&history, &self.config.metrics))
    }

    /// Active vehicles with a known position within `radius_km` of a point.
    pub fn find_nearby(&self, center: GeoPoint, radius_km: f64) -> Vec<Vehicle> {
        self.registry.find_nearby(center, radius_km)
    }

    /// Update a vehicle's operating mode, returning the previous mode.
    ///
    /// Mode only: moving a vehicle out of `Active` does not stop its
    /// timer - call [`Self::stop_tracking`] as well.
    pub fn set_mode(
        &self,
        id: &VehicleId,
        mode: VehicleMode,
    ) -> Result<VehicleMode, RegistryError> {
        self.registry.set_mode(id, mode)
    }

    /// Update a vehicle's route assignment.
    pub fn set_route(&self, id: &VehicleId, route: Option<RouteId>) -> Result<(), RegistryError> {
        self.registry.set_route(id, route)
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register an event callback under the given id.
    pub fn subscribe(&self, id: SubscriberId, callback: EventCallback) {
        self.bus.subscribe(id, callback);
    }

    /// Remove an event subscription.
    pub fn unsubscribe(&self, id: &SubscriberId) {
        self.bus.unsubscribe(id);
    }

    // ------------------------------------------------------------------
    // Tracking control
    // ------------------------------------------------------------------

    /// Begin periodic tracking for one vehicle.
    pub async fn start_tracking(
        &self,
        id: &VehicleId,
        period: std::time::Duration,
    ) -> Result<(), TrackingError> {
        self.tracking.start_tracking(id, period).await
    }

    /// Stop periodic tracking for one vehicle. No-op if untracked.
    pub async fn stop_tracking(&self, id: &VehicleId) -> Result<(), TrackingError> {
        self.tracking.stop_tracking(id).await
    }

    /// Start tracking every active vehicle at the configured period.
    pub async fn start_all(&self) -> Result<usize, TrackingError> {
        self.tracking.start_all().await
    }

    /// Stop every live timer.
    pub async fn stop_all(&self) -> Result<usize, TrackingError> {
        self.tracking.stop_all().await
    }

    /// Declare an emergency for a vehicle.
    pub async fn trigger_emergency(
        &self,
        id: &VehicleId,
        kind: EmergencyKind,
    ) -> Result<(), TrackingError> {
        self.tracking.trigger_emergency(id, kind).await
    }

    // ------------------------------------------------------------------
    // Component handles (for presenter wiring)
    // ------------------------------------------------------------------

    /// The engine's event bus.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The engine's vehicle registry.
    pub fn registry(&self) -> &Arc<VehicleRegistry> {
        &self.registry
    }

    /// The tracking control handle (cloneable).
    pub fn tracking(&self) -> &TrackingService {
        &self.tracking
    }

    /// The engine configuration.
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }
}
