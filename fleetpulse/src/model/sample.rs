//! Location samples - one timestamped telemetry observation per vehicle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

use super::vehicle::VehicleId;

/// One timestamped location observation for a vehicle.
///
/// Samples are immutable once created. They are appended to the per-vehicle
/// history by the tracking engine and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// The observed vehicle.
    pub vehicle_id: VehicleId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// When the observation was made.
    pub timestamp: DateTime<Utc>,
    /// Instantaneous speed in km/h as reported by the feed.
    pub speed_kmh: f64,
    /// Heading in degrees (0 = North, 90 = East).
    pub heading_deg: f64,
    /// Reported accuracy radius in meters.
    pub accuracy_m: f64,
}

impl LocationSample {
    /// Create a new sample.
    pub fn new(
        vehicle_id: VehicleId,
        lat: f64,
        lon: f64,
        timestamp: DateTime<Utc>,
        speed_kmh: f64,
        heading_deg: f64,
        accuracy_m: f64,
    ) -> Self {
        Self {
            vehicle_id,
            lat,
            lon,
            timestamp,
            speed_kmh,
            heading_deg,
            accuracy_m,
        }
    }

    /// The sample's position as a geographic point.
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_accessor() {
        let s = LocationSample::new(
            VehicleId::new("v1"),
            48.8566,
            2.3522,
            Utc::now(),
            35.0,
            90.0,
            8.0,
        );
        let p = s.position();
        assert!((p.lat - 48.8566).abs() < f64::EPSILON);
        assert!((p.lon - 2.3522).abs() < f64::EPSILON);
    }
}
