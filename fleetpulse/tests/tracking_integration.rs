//! Integration tests for the tracking engine.
//!
//! These tests verify the complete flow:
//! - ticker task → daemon → registry append → classifier → event bus
//! - timer idempotence and awaited cancellation
//! - emergency handling
//! - pull-based metrics and nearby queries over live history
//!
//! Run with: `cargo test --test tracking_integration`

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use fleetpulse::config::{ClassifierConfig, FleetConfig, SimulatorConfig, TrackingConfig};
use fleetpulse::geo::GeoPoint;
use fleetpulse::model::{
    EmergencyKind, LocationSample, TrackingEvent, Vehicle, VehicleMode, VehicleStatus,
};
use fleetpulse::simulator::SampleSource;
use fleetpulse::{FleetService, SubscriberId, TrackingError, VehicleId};

// ============================================================================
// Helper Functions
// ============================================================================

/// A short tick period that keeps tests fast but observable.
const TICK: Duration = Duration::from_millis(20);

/// Depot coordinate used across the tests.
const DEPOT: GeoPoint = GeoPoint {
    lat: 48.8566,
    lon: 2.3522,
};

/// Deterministic sample source: every tick yields the same scripted
/// position and speed.
struct FixedSampleSource {
    lat: f64,
    lon: f64,
    speed_kmh: f64,
}

impl SampleSource for FixedSampleSource {
    fn next_sample(&self, vehicle: &Vehicle, at: DateTime<Utc>) -> LocationSample {
        LocationSample::new(vehicle.id.clone(), self.lat, self.lon, at, self.speed_kmh, 0.0, 5.0)
    }
}

/// Shared event log collected from a bus subscription.
#[derive(Clone, Default)]
struct EventLog {
    events: Arc<Mutex<Vec<TrackingEvent>>>,
}

impl EventLog {
    fn subscribe(&self, service: &FleetService, id: &str) {
        let events = Arc::clone(&self.events);
        service.subscribe(
            SubscriberId::new(id),
            Arc::new(move |event| events.lock().push(event.clone())),
        );
    }

    fn location_updates(&self, vehicle: &VehicleId) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| {
                matches!(e, TrackingEvent::LocationUpdate { vehicle_id, .. } if vehicle_id == vehicle)
            })
            .count()
    }

    fn latest_status(&self, vehicle: &VehicleId) -> Option<VehicleStatus> {
        self.events
            .lock()
            .iter()
            .rev()
            .find_map(|e| match e {
                TrackingEvent::LocationUpdate {
                    vehicle_id, status, ..
                } if vehicle_id == vehicle => Some(*status),
                _ => None,
            })
    }
}

fn demo_fleet_config() -> FleetConfig {
    FleetConfig::default()
        .with_simulator(SimulatorConfig::default().with_reference_point(DEPOT))
        .with_classifier(ClassifierConfig::default().with_garage_point(DEPOT))
        .with_tracking(TrackingConfig::default().with_tick_period(TICK))
}

fn active_vehicle(id: &str) -> Vehicle {
    Vehicle::new(id, format!("FP-{}", id), 40)
}

/// Wait until `condition` holds or the timeout elapses.
async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Ticks flow from the timer through the daemon to subscribers.
#[tokio::test]
async fn test_tick_flow_emits_location_updates() {
    let service = FleetService::start(demo_fleet_config());
    let log = EventLog::default();
    log.subscribe(&service, "observer");

    let id = VehicleId::new("v1");
    service.register_vehicles(vec![active_vehicle("v1")]);
    service.start_tracking(&id, TICK).await.unwrap();

    assert!(
        wait_until(Duration::from_secs(2), || log.location_updates(&id) >= 3).await,
        "expected at least 3 location updates"
    );

    // History accumulated alongside the events
    let history = service.get_history(&id, None).unwrap();
    assert!(history.len() >= 3);

    service.shutdown().await;
}

/// Starting twice leaves exactly one live timer: a single stop fully
/// halts updates.
#[tokio::test]
async fn test_double_start_single_stop_halts_updates() {
    let service = FleetService::start(demo_fleet_config());
    let log = EventLog::default();
    log.subscribe(&service, "observer");

    let id = VehicleId::new("v1");
    service.register_vehicles(vec![active_vehicle("v1")]);

    service.start_tracking(&id, TICK).await.unwrap();
    service.start_tracking(&id, TICK).await.unwrap();

    assert!(wait_until(Duration::from_secs(2), || log.location_updates(&id) >= 2).await);

    // One stop must be enough, however many starts were issued
    service.stop_tracking(&id).await.unwrap();
    let after_stop = log.location_updates(&id);

    tokio::time::sleep(TICK * 5).await;
    assert_eq!(
        log.location_updates(&id),
        after_stop,
        "updates continued after stop_tracking returned"
    );

    service.shutdown().await;
}

/// stop_tracking on an untracked vehicle is a no-op, not an error.
#[tokio::test]
async fn test_stop_untracked_vehicle_is_noop() {
    let service = FleetService::start(demo_fleet_config());
    service.register_vehicles(vec![active_vehicle("v1")]);

    service.stop_tracking(&VehicleId::new("v1")).await.unwrap();

    service.shutdown().await;
}

/// start_all picks up active vehicles only; stop_all halts them all.
#[tokio::test]
async fn test_start_all_and_stop_all() {
    let service = FleetService::start(demo_fleet_config());
    let log = EventLog::default();
    log.subscribe(&service, "observer");

    service.register_vehicles(vec![
        active_vehicle("v1"),
        active_vehicle("v2"),
        active_vehicle("v3").with_mode(VehicleMode::Maintenance),
    ]);

    let started = service.start_all().await.unwrap();
    assert_eq!(started, 2, "only active vehicles are eligible");

    let v1 = VehicleId::new("v1");
    let v2 = VehicleId::new("v2");
    assert!(
        wait_until(Duration::from_secs(2), || {
            log.location_updates(&v1) >= 1 && log.location_updates(&v2) >= 1
        })
        .await
    );

    let stopped = service.stop_all().await.unwrap();
    assert_eq!(stopped, 2);

    let after = (log.location_updates(&v1), log.location_updates(&v2));
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(
        (log.location_updates(&v1), log.location_updates(&v2)),
        after
    );

    service.shutdown().await;
}

/// Emergency immediately sets the mode, halts updates, and publishes one
/// emergency event carrying the passenger count.
#[tokio::test]
async fn test_emergency_halts_tracking() {
    let service = FleetService::start(demo_fleet_config());
    let log = EventLog::default();
    log.subscribe(&service, "observer");

    let id = VehicleId::new("v1");
    service.register_vehicles(vec![active_vehicle("v1").with_passengers(12)]);
    service.start_tracking(&id, TICK).await.unwrap();

    assert!(wait_until(Duration::from_secs(2), || log.location_updates(&id) >= 1).await);

    service
        .trigger_emergency(&id, EmergencyKind::Breakdown)
        .await
        .unwrap();

    // Mode flipped synchronously
    assert_eq!(
        service.get_vehicle(&id).unwrap().mode,
        VehicleMode::Emergency
    );

    // Exactly one emergency event, carrying passengers and last location
    let emergencies: Vec<(u32, bool)> = log
        .events
        .lock()
        .iter()
        .filter_map(|e| match e {
            TrackingEvent::Emergency {
                passengers,
                location,
                ..
            } => Some((*passengers, location.is_some())),
            _ => None,
        })
        .collect();
    assert_eq!(emergencies, vec![(12, true)]);

    // No further location updates until tracking restarts
    let after = log.location_updates(&id);
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(log.location_updates(&id), after);

    // Restarting requires the vehicle to be active again
    let err = service.start_tracking(&id, TICK).await.unwrap_err();
    assert!(matches!(err, TrackingError::InvalidTransition { .. }));

    service.set_mode(&id, VehicleMode::Active).unwrap();
    service.start_tracking(&id, TICK).await.unwrap();
    assert!(
        wait_until(Duration::from_secs(2), || log.location_updates(&id) > after).await,
        "updates should resume after restart"
    );

    service.shutdown().await;
}

/// History stays capacity-bounded while the engine runs.
#[tokio::test]
async fn test_history_stays_bounded() {
    let capacity = 5;
    let config = demo_fleet_config().with_tracking(
        TrackingConfig::default()
            .with_tick_period(TICK)
            .with_history_capacity(capacity),
    );
    let service = FleetService::start(config);
    let log = EventLog::default();
    log.subscribe(&service, "observer");

    let id = VehicleId::new("v1");
    service.register_vehicles(vec![active_vehicle("v1")]);
    service.start_tracking(&id, TICK).await.unwrap();

    assert!(
        wait_until(Duration::from_secs(3), || {
            log.location_updates(&id) >= capacity + 3
        })
        .await
    );

    let history = service.get_history(&id, None).unwrap();
    assert_eq!(history.len(), capacity);

    service.shutdown().await;
}

/// A vehicle parked at the depot without a route classifies as Garage;
/// assigning a route at the same position flips it away from Garage.
#[tokio::test]
async fn test_garage_classification_depends_on_route() {
    let source = Arc::new(FixedSampleSource {
        lat: DEPOT.lat,
        lon: DEPOT.lon,
        speed_kmh: 0.0,
    });
    let service = FleetService::start_with_source(demo_fleet_config(), source);
    let log = EventLog::default();
    log.subscribe(&service, "observer");

    let id = VehicleId::new("v1");
    service.register_vehicles(vec![active_vehicle("v1")]);
    service.start_tracking(&id, TICK).await.unwrap();

    assert!(
        wait_until(Duration::from_secs(2), || {
            log.latest_status(&id) == Some(VehicleStatus::Garage)
        })
        .await,
        "parked depot vehicle should classify as Garage"
    );

    // Same position, now with a route assignment
    service
        .set_route(&id, Some(fleetpulse::RouteId::new("line-7")))
        .unwrap();

    let updates_at_change = log.location_updates(&id);
    assert!(
        wait_until(Duration::from_secs(2), || {
            log.location_updates(&id) > updates_at_change + 1
                && log.latest_status(&id) != Some(VehicleStatus::Garage)
        })
        .await,
        "route assignment must suppress Garage"
    );

    service.shutdown().await;
}

/// Nearby query filters by distance and mode against live positions.
#[tokio::test]
async fn test_find_nearby_over_live_positions() {
    let service = FleetService::start(demo_fleet_config());

    service.register_vehicles(vec![active_vehicle("near"), active_vehicle("far")]);

    let near = VehicleId::new("near");

    // Drive only "near" for a few ticks around the depot
    service.start_tracking(&near, TICK).await.unwrap();
    assert!(
        wait_until(Duration::from_secs(2), || {
            service.get_vehicle(&near).unwrap().last_sample.is_some()
        })
        .await
    );
    service.stop_tracking(&near).await.unwrap();

    // "far" never tracked: no last sample, so it never matches
    let nearby = service.find_nearby(DEPOT, 5.0);
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].id, near);

    // A query centered ~100 km away matches nothing
    let elsewhere = GeoPoint::new(49.9, 2.35);
    assert!(service.find_nearby(elsewhere, 5.0).is_empty());

    service.shutdown().await;
}

/// Metrics derive from the accumulated history on demand.
#[tokio::test]
async fn test_metrics_from_live_history() {
    let service = FleetService::start(demo_fleet_config());
    let log = EventLog::default();
    log.subscribe(&service, "observer");

    let id = VehicleId::new("v1");
    service.register_vehicles(vec![active_vehicle("v1")]);
    service.start_tracking(&id, TICK).await.unwrap();

    assert!(wait_until(Duration::from_secs(2), || log.location_updates(&id) >= 4).await);
    service.stop_tracking(&id).await.unwrap();

    let history = service.get_history(&id, None).unwrap();
    let metrics = service.get_metrics(&id).unwrap();

    // Simulated speeds are uniform in [10, 70)
    assert!(metrics.average_speed_kmh >= 10.0 && metrics.average_speed_kmh < 70.0);
    // Uptime follows the configured sampling period and the sample count
    let expected_uptime =
        history.len() as f64 * service.config().metrics.sampling_period.as_secs_f64() / 3600.0;
    assert!((metrics.uptime_h - (expected_uptime * 100.0).round() / 100.0).abs() < 1e-9);
    assert!(metrics.efficiency > 0.0 && metrics.efficiency <= 100.0);

    service.shutdown().await;
}

/// Subscribers added after events were published never see them; a
/// panicking subscriber never blocks its siblings.
#[tokio::test]
async fn test_subscriber_isolation_through_engine() {
    let service = FleetService::start(demo_fleet_config());

    // A subscriber that panics on every event
    service.subscribe(
        SubscriberId::new("faulty"),
        Arc::new(|_| panic!("subscriber bug")),
    );

    let log = EventLog::default();
    log.subscribe(&service, "healthy");

    let id = VehicleId::new("v1");
    service.register_vehicles(vec![active_vehicle("v1")]);
    service.start_tracking(&id, TICK).await.unwrap();

    assert!(
        wait_until(Duration::from_secs(2), || log.location_updates(&id) >= 2).await,
        "healthy subscriber must keep receiving despite the faulty one"
    );

    service.shutdown().await;
}

/// Shutdown halts every timer even without explicit stops.
#[tokio::test]
async fn test_shutdown_halts_all_timers() {
    let service = FleetService::start(demo_fleet_config());
    let log = EventLog::default();
    log.subscribe(&service, "observer");

    service.register_vehicles(vec![active_vehicle("v1"), active_vehicle("v2")]);
    service.start_all().await.unwrap();

    let v1 = VehicleId::new("v1");
    assert!(wait_until(Duration::from_secs(2), || log.location_updates(&v1) >= 1).await);

    service.shutdown().await;

    let after = log.events.lock().len();
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(log.events.lock().len(), after, "no events after shutdown");
}
