//! Plan command - query the routing service for a route through stops.

use clap::Args;

use fleetpulse::geo::GeoPoint;
use fleetpulse::routing::{
    OsrmConfig, OsrmRoutePlanner, ReqwestRoutingClient, RoutePlanner,
};

use crate::error::CliError;

/// Arguments for the plan command.
#[derive(Args)]
pub struct PlanArgs {
    /// Ordered stops as `lat,lon` pairs (at least two).
    #[arg(required = true, num_args = 2..)]
    pub stops: Vec<String>,

    /// Base URL of the OSRM-compatible routing server.
    #[arg(long, default_value = "https://router.project-osrm.org")]
    pub server: String,
}

/// Run the command: plan the route and print a summary.
pub async fn run(args: PlanArgs) -> Result<(), CliError> {
    let stops = args
        .stops
        .iter()
        .map(|s| parse_stop(s))
        .collect::<Result<Vec<_>, _>>()?;

    let client = ReqwestRoutingClient::new()?;
    let planner = OsrmRoutePlanner::new(
        client,
        OsrmConfig {
            base_url: args.server,
            ..OsrmConfig::default()
        },
    );

    let route = planner.plan(&stops).await?;

    println!(
        "route: {} points, {} legs, {:.1} min expected",
        route.polyline.len(),
        route.legs.len(),
        route.total_duration().as_secs_f64() / 60.0
    );
    for (i, leg) in route.legs.iter().enumerate() {
        println!("  leg {}: {:.1} min", i + 1, leg.duration.as_secs_f64() / 60.0);
    }
    Ok(())
}

fn parse_stop(s: &str) -> Result<GeoPoint, CliError> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| CliError::Usage(format!("stop '{}' is not a lat,lon pair", s)))?;

    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| CliError::Usage(format!("invalid latitude in '{}'", s)))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| CliError::Usage(format!("invalid longitude in '{}'", s)))?;

    Ok(GeoPoint::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stop() {
        let p = parse_stop("48.8566, 2.3522").unwrap();
        assert!((p.lat - 48.8566).abs() < 1e-9);
        assert!((p.lon - 2.3522).abs() < 1e-9);
    }

    #[test]
    fn test_parse_stop_rejects_garbage() {
        assert!(parse_stop("not-a-pair").is_err());
        assert!(parse_stop("48.85,east").is_err());
    }
}
