//! Derived operating status.

use serde::{Deserialize, Serialize};

/// Operating status of a vehicle, derived from positional and temporal
/// signals by the classifier.
///
/// Status is always recomputed from a snapshot; it is never stored as
/// ground truth. `Problem` is the one exception to derivation: it is only
/// ever produced by an explicit emergency trigger, never inferred from
/// idle time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    /// The vehicle is in motion.
    Moving,
    /// The vehicle is idle away from the garage.
    Stopped,
    /// An emergency has been declared.
    Problem,
    /// The vehicle is parked inside the garage geofence with no route.
    Garage,
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VehicleStatus::Moving => "moving",
            VehicleStatus::Stopped => "stopped",
            VehicleStatus::Problem => "problem",
            VehicleStatus::Garage => "garage",
        };
        write!(f, "{}", s)
    }
}
