//! Status classifier - derives operating status from positional and
//! temporal signals.
//!
//! Classification is a pure function over an immutable snapshot: the
//! vehicle (for its route assignment), the last two samples, and `now`.
//! Nothing here mutates state, which keeps every branch trivially
//! unit-testable.
//!
//! The classifier never yields [`VehicleStatus::Problem`]: Problem is set
//! exclusively by the explicit emergency path in the tracking service.
//! Idle time alone can only produce `Stopped`.

use chrono::{DateTime, Utc};

use crate::config::ClassifierConfig;
use crate::geo::{haversine_distance_km, within_radius_km};
use crate::model::{LocationSample, Vehicle, VehicleStatus};

/// Derive a vehicle's operating status.
///
/// Decision order:
/// 1. No route assignment and the latest sample inside the garage
///    geofence → `Garage`.
/// 2. Reported speed above the speed floor → `Moving`.
/// 3. Displacement from the previous sample above the displacement
///    floor → `Moving`.
/// 4. Otherwise, elapsed time since the latest sample decides: zero
///    elapsed still counts as `Moving`, anything older is `Stopped`.
pub fn classify(
    vehicle: &Vehicle,
    latest: &LocationSample,
    previous: Option<&LocationSample>,
    now: DateTime<Utc>,
    config: &ClassifierConfig,
) -> VehicleStatus {
    // Parked at the depot: no route, inside the geofence
    if !vehicle.has_route()
        && within_radius_km(config.garage_point, latest.position(), config.garage_radius_km)
    {
        return VehicleStatus::Garage;
    }

    if latest.speed_kmh > config.speed_floor_kmh {
        return VehicleStatus::Moving;
    }

    if let Some(previous) = previous {
        let displacement_km = haversine_distance_km(previous.position(), latest.position());
        if displacement_km > config.displacement_floor_km {
            return VehicleStatus::Moving;
        }
    }

    // No movement detected between the last two samples: the last movement
    // is no later than the previous sample. With a single sample, the
    // sample itself is the reference point.
    let last_movement_at = previous.map_or(latest.timestamp, |p| p.timestamp);
    let idle = now.signed_duration_since(last_movement_at);
    if idle <= chrono::Duration::zero() {
        VehicleStatus::Moving
    } else {
        VehicleStatus::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::model::{RouteId, VehicleId};
    use chrono::{Duration, TimeZone};

    const GARAGE: GeoPoint = GeoPoint {
        lat: 48.8566,
        lon: 2.3522,
    };

    fn config() -> ClassifierConfig {
        ClassifierConfig::default().with_garage_point(GARAGE)
    }

    fn base_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn sample(lat: f64, lon: f64, speed: f64, at: DateTime<Utc>) -> LocationSample {
        LocationSample::new(VehicleId::new("v1"), lat, lon, at, speed, 0.0, 5.0)
    }

    #[test]
    fn test_garage_when_parked_without_route() {
        let vehicle = Vehicle::new("v1", "AA", 40);
        let latest = sample(GARAGE.lat, GARAGE.lon, 0.0, base_time());

        let status = classify(&vehicle, &latest, None, base_time(), &config());
        assert_eq!(status, VehicleStatus::Garage);
    }

    #[test]
    fn test_route_assignment_suppresses_garage() {
        // Same position, same idle sample - only the route flag differs
        let vehicle = Vehicle::new("v1", "AA", 40).with_route(RouteId::new("line-3"));
        let at = base_time();
        let latest = sample(GARAGE.lat, GARAGE.lon, 0.0, at);

        let status = classify(&vehicle, &latest, None, at + Duration::seconds(30), &config());
        assert_ne!(status, VehicleStatus::Garage);
        assert_eq!(status, VehicleStatus::Stopped);
    }

    #[test]
    fn test_outside_geofence_is_not_garage() {
        let vehicle = Vehicle::new("v1", "AA", 40);
        // ~1.1 km north of the garage
        let latest = sample(GARAGE.lat + 0.01, GARAGE.lon, 20.0, base_time());

        let status = classify(&vehicle, &latest, None, base_time(), &config());
        assert_eq!(status, VehicleStatus::Moving);
    }

    #[test]
    fn test_reported_speed_above_floor_is_moving() {
        let vehicle = Vehicle::new("v1", "AA", 40).with_route(RouteId::new("r"));
        let latest = sample(48.9, 2.4, 0.6, base_time());

        let status = classify(&vehicle, &latest, None, base_time(), &config());
        assert_eq!(status, VehicleStatus::Moving);
    }

    #[test]
    fn test_displacement_above_floor_is_moving() {
        let vehicle = Vehicle::new("v1", "AA", 40).with_route(RouteId::new("r"));
        let at = base_time();
        // ~110 m apart, both with zero reported speed
        let previous = sample(48.9000, 2.4, 0.0, at - Duration::seconds(3));
        let latest = sample(48.9010, 2.4, 0.0, at);

        let status = classify(
            &vehicle,
            &latest,
            Some(&previous),
            at + Duration::seconds(10),
            &config(),
        );
        assert_eq!(status, VehicleStatus::Moving);
    }

    #[test]
    fn test_idle_zero_distance_samples_are_stopped() {
        // Two consecutive zero-distance samples, zero speed, nonzero idle
        let vehicle = Vehicle::new("v1", "AA", 40).with_route(RouteId::new("r"));
        let at = base_time();
        let previous = sample(48.9, 2.4, 0.0, at - Duration::seconds(3));
        let latest = sample(48.9, 2.4, 0.0, at);

        let status = classify(
            &vehicle,
            &latest,
            Some(&previous),
            at + Duration::seconds(30),
            &config(),
        );
        assert_eq!(status, VehicleStatus::Stopped);
    }

    #[test]
    fn test_zero_idle_time_is_moving() {
        let vehicle = Vehicle::new("v1", "AA", 40).with_route(RouteId::new("r"));
        let at = base_time();
        let latest = sample(48.9, 2.4, 0.0, at);

        // Sample stamped exactly `now`
        let status = classify(&vehicle, &latest, None, at, &config());
        assert_eq!(status, VehicleStatus::Moving);
    }

    #[test]
    fn test_idle_never_yields_problem() {
        // However long the idle time, the classifier only says Stopped;
        // Problem comes exclusively from the emergency path.
        let vehicle = Vehicle::new("v1", "AA", 40).with_route(RouteId::new("r"));
        let at = base_time();
        let latest = sample(48.9, 2.4, 0.0, at);

        let status = classify(
            &vehicle,
            &latest,
            None,
            at + Duration::hours(6),
            &config(),
        );
        assert_eq!(status, VehicleStatus::Stopped);
    }

    #[test]
    fn test_speed_at_floor_is_not_moving() {
        let vehicle = Vehicle::new("v1", "AA", 40).with_route(RouteId::new("r"));
        let at = base_time();
        let latest = sample(48.9, 2.4, 0.5, at);

        let status = classify(&vehicle, &latest, None, at + Duration::seconds(5), &config());
        assert_eq!(status, VehicleStatus::Stopped);
    }
}
