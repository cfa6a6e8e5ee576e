//! Run command - simulate a fleet and stream tracking events.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::info;

use fleetpulse::config::{FleetConfig, TrackingConfig};
use fleetpulse::{FleetService, SubscriberId, TrackingEvent, Vehicle};

use crate::error::CliError;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Number of vehicles to simulate.
    #[arg(long, default_value_t = 5)]
    pub vehicles: usize,

    /// Tick period in milliseconds.
    #[arg(long, default_value_t = 3000)]
    pub period_ms: u64,

    /// Emit events as JSON lines instead of human-readable text.
    #[arg(long)]
    pub json: bool,
}

/// Run the command: seed, subscribe, start, wait for Ctrl-C, shut down.
pub async fn run(args: RunArgs) -> Result<(), CliError> {
    if args.vehicles == 0 {
        return Err(CliError::Usage("--vehicles must be at least 1".to_string()));
    }
    if args.period_ms == 0 {
        return Err(CliError::Usage("--period-ms must be at least 1".to_string()));
    }

    let config = FleetConfig::default().with_tracking(
        TrackingConfig::default().with_tick_period(Duration::from_millis(args.period_ms)),
    );
    let service = FleetService::start(config);

    service.register_vehicles(demo_fleet(args.vehicles));

    let json = args.json;
    service.subscribe(
        SubscriberId::new("terminal"),
        Arc::new(move |event| print_event(event, json)),
    );

    let started = service.start_all().await?;
    info!(started, "fleet tracking running; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| CliError::Usage(format!("failed to listen for Ctrl-C: {}", e)))?;

    info!("shutting down");
    service.stop_all().await?;
    service.shutdown().await;
    Ok(())
}

/// Build a demo fleet of sequentially numbered vehicles.
fn demo_fleet(count: usize) -> Vec<Vehicle> {
    (1..=count)
        .map(|n| {
            Vehicle::new(
                format!("bus-{:02}", n),
                format!("FP-{:03}-PL", n),
                40,
            )
            .with_passengers((n as u32 * 7) % 40)
        })
        .collect()
}

fn print_event(event: &TrackingEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
        }
        return;
    }

    match event {
        TrackingEvent::LocationUpdate {
            vehicle_id,
            sample,
            status,
            ..
        } => println!(
            "{}  {}  ({:.5}, {:.5})  {:.0} km/h",
            vehicle_id, status, sample.lat, sample.lon, sample.speed_kmh
        ),
        TrackingEvent::StatusChange {
            vehicle_id,
            previous,
            current,
            ..
        } => println!("{}  status {} -> {}", vehicle_id, previous, current),
        TrackingEvent::Emergency {
            vehicle_id,
            kind,
            passengers,
            ..
        } => println!(
            "{}  EMERGENCY ({}) with {} passengers aboard",
            vehicle_id, kind, passengers
        ),
        TrackingEvent::TrackingStarted { vehicle_id, .. } => {
            println!("{}  tracking started", vehicle_id)
        }
        TrackingEvent::TrackingStopped { vehicle_id, .. } => {
            println!("{}  tracking stopped", vehicle_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_fleet_size_and_ids() {
        let fleet = demo_fleet(3);
        assert_eq!(fleet.len(), 3);
        assert_eq!(fleet[0].id.as_str(), "bus-01");
        assert_eq!(fleet[2].id.as_str(), "bus-03");
    }

    #[test]
    fn test_demo_fleet_passengers_within_capacity() {
        for vehicle in demo_fleet(20) {
            assert!(vehicle.passengers <= vehicle.capacity);
        }
    }
}
