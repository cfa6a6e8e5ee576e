//! Tracking engine error types.

use std::fmt;

use crate::model::{VehicleId, VehicleMode};
use crate::registry::RegistryError;

/// Errors produced by tracking operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    /// The vehicle id is not registered.
    NotFound(VehicleId),

    /// The operation is not valid for the vehicle's current mode,
    /// e.g. starting tracking on a vehicle that is not active.
    InvalidTransition { id: VehicleId, mode: VehicleMode },

    /// The engine has shut down; no commands can be processed.
    Shutdown,
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingError::NotFound(id) => write!(f, "unknown vehicle: {}", id),
            TrackingError::InvalidTransition { id, mode } => {
                write!(f, "vehicle {} is {}, not active", id, mode)
            }
            TrackingError::Shutdown => write!(f, "tracking engine has shut down"),
        }
    }
}

impl std::error::Error for TrackingError {}

impl From<RegistryError> for TrackingError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(id) => TrackingError::NotFound(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = TrackingError::NotFound(VehicleId::new("ghost"));
        assert!(err.to_string().contains("ghost"));

        let err = TrackingError::InvalidTransition {
            id: VehicleId::new("v1"),
            mode: VehicleMode::Maintenance,
        };
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn test_from_registry_error() {
        let err: TrackingError = RegistryError::NotFound(VehicleId::new("v1")).into();
        assert!(matches!(err, TrackingError::NotFound(_)));
    }
}
