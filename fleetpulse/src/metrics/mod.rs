//! Metrics engine - aggregate movement metrics derived from history.
//!
//! Metrics are never stored: every call recomputes from the sample history
//! it is given, so a result is exactly as fresh as the history behind it.
//!
//! A history with fewer than two samples produces the all-zero result
//! rather than an error - "no data yet" is a normal state for a vehicle
//! that just started tracking.

use serde::{Deserialize, Serialize};

use crate::config::MetricsConfig;
use crate::geo::haversine_distance_km;
use crate::model::LocationSample;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Aggregate movement metrics for one vehicle.
///
/// All values are rounded to two decimal places for display.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleMetrics {
    /// Total distance covered by the history, in kilometers.
    pub total_distance_km: f64,
    /// Mean of the per-sample reported speeds, in km/h.
    ///
    /// Deliberately not distance/elapsed-time: samples already carry
    /// instantaneous speed from the feed.
    pub average_speed_kmh: f64,
    /// Estimated fuel consumption, in liters.
    pub fuel_consumption_l: f64,
    /// Tracked uptime, in hours.
    pub uptime_h: f64,
    /// Efficiency score in `[0, 100]`.
    pub efficiency: f64,
}

/// Round to two decimal places for display.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute aggregate metrics from a vehicle's sample history.
///
/// The history must be time-ordered, oldest first (as returned by the
/// registry). Fewer than two samples yields `VehicleMetrics::default()`.
pub fn compute_metrics(history: &[LocationSample], config: &MetricsConfig) -> VehicleMetrics {
    if history.len() < 2 {
        return VehicleMetrics::default();
    }

    let total_distance_km: f64 = history
        .windows(2)
        .map(|pair| haversine_distance_km(pair[0].position(), pair[1].position()))
        .sum();

    let average_speed_kmh =
        history.iter().map(|s| s.speed_kmh).sum::<f64>() / history.len() as f64;

    let fuel_consumption_l = total_distance_km * config.fuel_rate_l_per_km;

    let uptime_h =
        history.len() as f64 * config.sampling_period.as_secs_f64() / SECONDS_PER_HOUR;

    let efficiency = (average_speed_kmh / config.reference_speed_kmh * 100.0).min(100.0);

    VehicleMetrics {
        total_distance_km: round2(total_distance_km),
        average_speed_kmh: round2(average_speed_kmh),
        fuel_consumption_l: round2(fuel_consumption_l),
        uptime_h: round2(uptime_h),
        efficiency: round2(efficiency),
    }
}
