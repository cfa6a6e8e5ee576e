//! CLI error types.

use std::fmt;

use fleetpulse::routing::RoutingError;
use fleetpulse::TrackingError;

/// Errors surfaced to the CLI user.
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line input.
    Usage(String),

    /// A tracking operation failed.
    Tracking(TrackingError),

    /// The routing service failed.
    Routing(RoutingError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Tracking(e) => write!(f, "tracking failed: {}", e),
            CliError::Routing(e) => write!(f, "routing failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Usage(_) => None,
            CliError::Tracking(e) => Some(e),
            CliError::Routing(e) => Some(e),
        }
    }
}

impl From<TrackingError> for CliError {
    fn from(e: TrackingError) -> Self {
        CliError::Tracking(e)
    }
}

impl From<RoutingError> for CliError {
    fn from(e: RoutingError) -> Self {
        CliError::Routing(e)
    }
}
