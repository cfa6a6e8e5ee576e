//! Tracking events published on the event bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::time::Duration;

use super::sample::LocationSample;
use super::status::VehicleStatus;
use super::vehicle::VehicleId;

/// Category of a declared emergency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyKind {
    /// Mechanical failure.
    Breakdown,
    /// Traffic accident.
    Accident,
    /// Security incident on board.
    Security,
    /// Medical incident on board.
    Medical,
}

impl std::fmt::Display for EmergencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EmergencyKind::Breakdown => "breakdown",
            EmergencyKind::Accident => "accident",
            EmergencyKind::Security => "security",
            EmergencyKind::Medical => "medical",
        };
        write!(f, "{}", s)
    }
}

/// An event published by the tracking engine.
///
/// Events are transient: they are delivered to the subscribers registered
/// at publish time and never queued or replayed. Each variant carries the
/// vehicle id, its payload, and the publish timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TrackingEvent {
    /// A new location sample was recorded for a vehicle.
    LocationUpdate {
        vehicle_id: VehicleId,
        sample: LocationSample,
        status: VehicleStatus,
        timestamp: DateTime<Utc>,
    },
    /// The derived status changed between consecutive ticks.
    StatusChange {
        vehicle_id: VehicleId,
        previous: VehicleStatus,
        current: VehicleStatus,
        timestamp: DateTime<Utc>,
    },
    /// An emergency was declared for a vehicle.
    Emergency {
        vehicle_id: VehicleId,
        kind: EmergencyKind,
        /// Last known location at the time of the emergency, if any.
        location: Option<LocationSample>,
        /// Passengers on board at the time of the emergency.
        passengers: u32,
        timestamp: DateTime<Utc>,
    },
    /// Periodic tracking started for a vehicle.
    TrackingStarted {
        vehicle_id: VehicleId,
        #[serde(with = "duration_millis")]
        period: Duration,
        timestamp: DateTime<Utc>,
    },
    /// Periodic tracking stopped for a vehicle.
    TrackingStopped {
        vehicle_id: VehicleId,
        timestamp: DateTime<Utc>,
    },
}

impl TrackingEvent {
    /// The vehicle this event concerns.
    pub fn vehicle_id(&self) -> &VehicleId {
        match self {
            TrackingEvent::LocationUpdate { vehicle_id, .. }
            | TrackingEvent::StatusChange { vehicle_id, .. }
            | TrackingEvent::Emergency { vehicle_id, .. }
            | TrackingEvent::TrackingStarted { vehicle_id, .. }
            | TrackingEvent::TrackingStopped { vehicle_id, .. } => vehicle_id,
        }
    }

    /// The publish timestamp of this event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TrackingEvent::LocationUpdate { timestamp, .. }
            | TrackingEvent::StatusChange { timestamp, .. }
            | TrackingEvent::Emergency { timestamp, .. }
            | TrackingEvent::TrackingStarted { timestamp, .. }
            | TrackingEvent::TrackingStopped { timestamp, .. } => *timestamp,
        }
    }
}

/// Serialize tick periods as integer milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_id_accessor() {
        let event = TrackingEvent::TrackingStopped {
            vehicle_id: VehicleId::new("v7"),
            timestamp: Utc::now(),
        };
        assert_eq!(event.vehicle_id().as_str(), "v7");
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = TrackingEvent::TrackingStarted {
            vehicle_id: VehicleId::new("v1"),
            period: Duration::from_millis(2500),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"tracking-started\""));
        assert!(json.contains("\"period\":2500"));
    }
}
