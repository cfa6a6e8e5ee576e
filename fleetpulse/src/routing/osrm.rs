//! OSRM-style route planner.
//!
//! Speaks the OSRM v1 route API with GeoJSON geometry: coordinates go in
//! the URL as `lon,lat` pairs, the response carries the full route
//! geometry plus one duration per leg.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;

use crate::geo::GeoPoint;

use super::{PlannedRoute, RouteLeg, RoutePlanner, RoutingError, RoutingHttpClient};

/// Configuration for the OSRM planner.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of the OSRM server, without a trailing slash.
    pub base_url: String,
    /// Routing profile (e.g. "driving").
    pub profile: String,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
        }
    }
}

/// Route planner backed by an OSRM-compatible HTTP service.
pub struct OsrmRoutePlanner<C: RoutingHttpClient> {
    client: C,
    config: OsrmConfig,
}

impl<C: RoutingHttpClient> OsrmRoutePlanner<C> {
    /// Create a planner over the given HTTP client.
    pub fn new(client: C, config: OsrmConfig) -> Self {
        Self { client, config }
    }

    fn request_url(&self, stops: &[GeoPoint]) -> String {
        let coordinates = stops
            .iter()
            .map(|p| format!("{},{}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.config.base_url, self.config.profile, coordinates
        )
    }

    fn decode(body: &[u8]) -> Result<PlannedRoute, RoutingError> {
        let response: OsrmResponse = serde_json::from_slice(body)
            .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

        if response.code != "Ok" {
            return match response.code.as_str() {
                "NoRoute" | "NoSegment" => Err(RoutingError::NoRoute),
                code => Err(RoutingError::Unavailable(format!(
                    "routing service answered {}",
                    code
                ))),
            };
        }

        let route = response.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;

        let polyline = route
            .geometry
            .coordinates
            .into_iter()
            .map(|pair| match pair.as_slice() {
                // GeoJSON order: [lon, lat]
                [lon, lat, ..] => Ok(GeoPoint::new(*lat, *lon)),
                _ => Err(RoutingError::InvalidResponse(
                    "geometry coordinate with fewer than 2 components".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let legs = route
            .legs
            .into_iter()
            .map(|leg| RouteLeg {
                duration: Duration::from_secs_f64(leg.duration.max(0.0)),
            })
            .collect();

        Ok(PlannedRoute { polyline, legs })
    }
}

impl<C: RoutingHttpClient> RoutePlanner for OsrmRoutePlanner<C> {
    fn plan<'a>(
        &'a self,
        stops: &'a [GeoPoint],
    ) -> Pin<Box<dyn Future<Output = Result<PlannedRoute, RoutingError>> + Send + 'a>> {
        Box::pin(async move {
            if stops.len() < 2 {
                return Err(RoutingError::InvalidRequest(format!(
                    "need at least 2 stops, got {}",
                    stops.len()
                )));
            }

            let url = self.request_url(stops);
            let body = self.client.get(&url).await?;
            Self::decode(&body)
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    #[serde(default)]
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    duration: f64,
}
