//! Routing collaborator abstraction.
//!
//! The engine does no path planning of its own: given ordered stops, an
//! external routing service returns a polyline and per-leg durations, or a
//! failure. This module defines the seam ([`RoutePlanner`]), the data it
//! exchanges, and an HTTP implementation speaking the OSRM route API.
//!
//! Failures distinguish "the service is unavailable or timed out" from
//! "the capability is not permitted" - the presentation layer renders
//! these differently, and a failure is terminal only for the affected
//! path-animation session.

mod http;
mod osrm;

pub use http::{ReqwestRoutingClient, RoutingHttpClient};
pub use osrm::{OsrmConfig, OsrmRoutePlanner};

#[cfg(test)]
pub use http::tests::MockRoutingClient;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::geo::GeoPoint;

/// Errors from the routing collaborator.
#[derive(Debug, Clone, Error)]
pub enum RoutingError {
    /// The request itself was malformed (e.g. fewer than two stops).
    #[error("invalid routing request: {0}")]
    InvalidRequest(String),

    /// The service could not be reached or answered with a server error.
    #[error("routing service unavailable: {0}")]
    Unavailable(String),

    /// The request did not complete within the client timeout.
    #[error("routing request timed out after {0:?}")]
    Timeout(Duration),

    /// The service refused the request for authorization reasons.
    #[error("routing not permitted: {0}")]
    NotPermitted(String),

    /// The service answered but the payload could not be decoded.
    #[error("invalid routing response: {0}")]
    InvalidResponse(String),

    /// The service found no route between the stops.
    #[error("no route found between the given stops")]
    NoRoute,
}

impl RoutingError {
    /// Whether the failure is an availability problem (unreachable or
    /// timed out) as opposed to a permission or request problem.
    pub fn is_availability(&self) -> bool {
        matches!(self, RoutingError::Unavailable(_) | RoutingError::Timeout(_))
    }
}

/// One leg of a planned route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    /// Expected travel time for this leg.
    pub duration: Duration,
}

/// A route returned by the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    /// Ordered points tracing the route geometry.
    pub polyline: Vec<GeoPoint>,
    /// One leg per consecutive pair of stops.
    pub legs: Vec<RouteLeg>,
}

impl PlannedRoute {
    /// Total expected travel time across all legs.
    pub fn total_duration(&self) -> Duration {
        self.legs.iter().map(|l| l.duration).sum()
    }
}

/// Plans routes through ordered stops.
///
/// Dyn-compatible: the single method returns a boxed future so planners
/// can live behind `Arc<dyn RoutePlanner>` in the presenter.
pub trait RoutePlanner: Send + Sync {
    /// Plan a route visiting `stops` in order.
    fn plan<'a>(
        &'a self,
        stops: &'a [GeoPoint],
    ) -> Pin<Box<dyn Future<Output = Result<PlannedRoute, RoutingError>> + Send + 'a>>;
}
