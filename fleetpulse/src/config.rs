//! Engine configuration.
//!
//! This module defines `FleetConfig` which combines all configuration needed
//! to start the tracking engine: simulator, classifier, metrics, and
//! tracking settings. Each component config carries documented defaults and
//! builder-style setters so callers only override what they need.
//!
//! Thresholds that drive behavior (speed floor, displacement floor, garage
//! geofence) live here rather than as literals in the components.

use std::time::Duration;

use crate::geo::GeoPoint;

/// Default per-vehicle history capacity.
///
/// Oldest samples are evicted once a vehicle's history exceeds this bound.
/// 100 samples at the default cadence covers several minutes of movement,
/// enough for metrics while keeping memory flat.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Default tick period for periodic tracking.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(3);

/// Default command channel capacity for the tracker daemon.
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 256;

/// Default reference coordinate for the simulated fleet (a Paris depot).
pub const DEFAULT_REFERENCE_POINT: GeoPoint = GeoPoint {
    lat: 48.8566,
    lon: 2.3522,
};

/// Default garage coordinate. Co-located with the reference point: the
/// simulated fleet operates around its own depot.
pub const DEFAULT_GARAGE_POINT: GeoPoint = DEFAULT_REFERENCE_POINT;

/// Default garage geofence radius in kilometers (100 m).
pub const DEFAULT_GARAGE_RADIUS_KM: f64 = 0.1;

/// Default speed floor in km/h below which a sample does not count as
/// movement on its own.
pub const DEFAULT_SPEED_FLOOR_KMH: f64 = 0.5;

/// Default displacement floor in kilometers (~10 m) between consecutive
/// samples below which the vehicle is considered stationary.
pub const DEFAULT_DISPLACEMENT_FLOOR_KM: f64 = 0.01;

/// Default fuel consumption rate in liters per kilometer.
pub const DEFAULT_FUEL_RATE_L_PER_KM: f64 = 0.35;

/// Default reference speed in km/h for the efficiency score.
pub const DEFAULT_REFERENCE_SPEED_KMH: f64 = 50.0;

/// Configuration for the location simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Center of the simulated operating area.
    pub reference_point: GeoPoint,
    /// Maximum random offset from the reference point, in degrees.
    pub max_offset_deg: f64,
    /// Generated speeds are uniform in `[speed_min_kmh, speed_max_kmh)`.
    pub speed_min_kmh: f64,
    /// Exclusive upper bound for generated speeds.
    pub speed_max_kmh: f64,
    /// Generated accuracy radii are uniform in
    /// `[accuracy_min_m, accuracy_max_m)`.
    pub accuracy_min_m: f64,
    /// Exclusive upper bound for generated accuracy radii.
    pub accuracy_max_m: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            reference_point: DEFAULT_REFERENCE_POINT,
            max_offset_deg: 0.01,
            speed_min_kmh: 10.0,
            speed_max_kmh: 70.0,
            accuracy_min_m: 5.0,
            accuracy_max_m: 15.0,
        }
    }
}

impl SimulatorConfig {
    /// Set the reference coordinate.
    pub fn with_reference_point(mut self, point: GeoPoint) -> Self {
        self.reference_point = point;
        self
    }

    /// Set the maximum positional offset in degrees.
    pub fn with_max_offset_deg(mut self, offset: f64) -> Self {
        self.max_offset_deg = offset;
        self
    }
}

/// Configuration for the status classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Center of the garage geofence.
    pub garage_point: GeoPoint,
    /// Garage geofence radius in kilometers.
    pub garage_radius_km: f64,
    /// Reported speed above this counts as movement.
    pub speed_floor_kmh: f64,
    /// Displacement between consecutive samples above this counts as
    /// movement.
    pub displacement_floor_km: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            garage_point: DEFAULT_GARAGE_POINT,
            garage_radius_km: DEFAULT_GARAGE_RADIUS_KM,
            speed_floor_kmh: DEFAULT_SPEED_FLOOR_KMH,
            displacement_floor_km: DEFAULT_DISPLACEMENT_FLOOR_KM,
        }
    }
}

impl ClassifierConfig {
    /// Set the garage geofence center.
    pub fn with_garage_point(mut self, point: GeoPoint) -> Self {
        self.garage_point = point;
        self
    }

    /// Set the garage geofence radius.
    pub fn with_garage_radius_km(mut self, radius_km: f64) -> Self {
        self.garage_radius_km = radius_km;
        self
    }
}

/// Configuration for the metrics engine.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Fuel consumption rate in liters per kilometer.
    pub fuel_rate_l_per_km: f64,
    /// Reference speed for the efficiency score.
    pub reference_speed_kmh: f64,
    /// Sampling period assumed when deriving uptime from sample counts.
    pub sampling_period: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            fuel_rate_l_per_km: DEFAULT_FUEL_RATE_L_PER_KM,
            reference_speed_kmh: DEFAULT_REFERENCE_SPEED_KMH,
            sampling_period: DEFAULT_TICK_PERIOD,
        }
    }
}

impl MetricsConfig {
    /// Set the sampling period used for uptime derivation.
    pub fn with_sampling_period(mut self, period: Duration) -> Self {
        self.sampling_period = period;
        self
    }
}

/// Configuration for the tracker daemon.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Per-vehicle history capacity.
    pub history_capacity: usize,
    /// Tick period used by `start_all` and callers that do not specify one.
    pub tick_period: Duration,
    /// Capacity of the daemon command channel.
    pub channel_capacity: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            tick_period: DEFAULT_TICK_PERIOD,
            channel_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
        }
    }
}

impl TrackingConfig {
    /// Set the per-vehicle history capacity.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set the default tick period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }
}

/// Engine configuration combining all component configs.
///
/// This is the top-level configuration passed to `FleetService::start()`.
#[derive(Debug, Clone, Default)]
pub struct FleetConfig {
    /// Location simulator settings.
    pub simulator: SimulatorConfig,
    /// Status classifier thresholds.
    pub classifier: ClassifierConfig,
    /// Metrics engine constants.
    pub metrics: MetricsConfig,
    /// Tracker daemon settings.
    pub tracking: TrackingConfig,
}

impl FleetConfig {
    /// Replace the simulator settings.
    pub fn with_simulator(mut self, simulator: SimulatorConfig) -> Self {
        self.simulator = simulator;
        self
    }

    /// Replace the classifier settings.
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the metrics settings.
    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the tracking settings.
    pub fn with_tracking(mut self, tracking: TrackingConfig) -> Self {
        self.tracking = tracking;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let config = FleetConfig::default();
        assert_eq!(config.tracking.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(config.tracking.tick_period, DEFAULT_TICK_PERIOD);
        assert!(config.simulator.speed_min_kmh < config.simulator.speed_max_kmh);
        assert!(config.classifier.garage_radius_km > 0.0);
    }

    #[test]
    fn test_builder_overrides() {
        let config = FleetConfig::default()
            .with_tracking(
                TrackingConfig::default()
                    .with_history_capacity(10)
                    .with_tick_period(Duration::from_millis(50)),
            )
            .with_classifier(ClassifierConfig::default().with_garage_radius_km(0.5));

        assert_eq!(config.tracking.history_capacity, 10);
        assert_eq!(config.tracking.tick_period, Duration::from_millis(50));
        assert!((config.classifier.garage_radius_km - 0.5).abs() < f64::EPSILON);
    }
}
