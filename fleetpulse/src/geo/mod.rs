//! Geographic math module
//!
//! Provides great-circle distance, radius membership tests, and bearing
//! calculation over latitude/longitude pairs. Shared by the status
//! classifier, the metrics engine, the nearby query, and the map presenter.
//!
//! All math uses a spherical Earth model, which is sufficient for
//! city-scale fleet data. This is not a geodetic library.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers, used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (positive north).
    pub lat: f64,
    /// Longitude in degrees (positive east).
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

/// Great-circle distance between two points in kilometers.
///
/// Uses the spherical law of haversines with a mean Earth radius of
/// 6371 km. Symmetric in its arguments; zero for identical points.
#[inline]
pub fn haversine_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Test whether `point` lies within `radius_km` of `center`.
#[inline]
pub fn within_radius_km(center: GeoPoint, point: GeoPoint, radius_km: f64) -> bool {
    haversine_distance_km(center, point) <= radius_km
}

/// Initial bearing from `a` to `b` in degrees (0 = North, 90 = East).
///
/// Used by the presenter when stepping a marker along a polyline.
#[inline]
pub fn initial_bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let bearing = y.atan2(x).to_degrees();

    // Normalize to 0-360
    (bearing + 360.0) % 360.0
}
