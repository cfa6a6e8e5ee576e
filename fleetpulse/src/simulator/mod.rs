//! Location simulator - synthetic telemetry source.
//!
//! Stands in for a real telemetry feed: each call produces one sample with
//! a bounded random offset from a configured reference coordinate, a
//! uniform speed in `[10, 70)` km/h, a uniform heading in `[0, 360)`, and a
//! small accuracy radius.
//!
//! The [`SampleSource`] trait is the injection seam: it is the only source
//! of nondeterminism in the engine, so tests substitute a deterministic
//! scripted source and everything downstream stays reproducible.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::SimulatorConfig;
use crate::model::{LocationSample, Vehicle};

/// Source of location samples for tracked vehicles.
///
/// Implementations must be cheap to call on every tick and safe to share
/// across the daemon and tests.
pub trait SampleSource: Send + Sync {
    /// Produce one sample for the given vehicle, stamped `at`.
    fn next_sample(&self, vehicle: &Vehicle, at: DateTime<Utc>) -> LocationSample;
}

/// Random sample source used by the simulation engine.
pub struct RandomSampleSource {
    config: SimulatorConfig,
}

impl RandomSampleSource {
    /// Create a random source with the given configuration.
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }
}

impl Default for RandomSampleSource {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl SampleSource for RandomSampleSource {
    fn next_sample(&self, vehicle: &Vehicle, at: DateTime<Utc>) -> LocationSample {
        let mut rng = rand::thread_rng();
        let offset = self.config.max_offset_deg;

        LocationSample::new(
            vehicle.id.clone(),
            self.config.reference_point.lat + rng.gen_range(-offset..offset),
            self.config.reference_point.lon + rng.gen_range(-offset..offset),
            at,
            rng.gen_range(self.config.speed_min_kmh..self.config.speed_max_kmh),
            rng.gen_range(0.0..360.0),
            rng.gen_range(self.config.accuracy_min_m..self.config.accuracy_max_m),
        )
    }
}
