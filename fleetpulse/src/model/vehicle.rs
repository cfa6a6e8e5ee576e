//! Vehicle identity and canonical state.

use serde::{Deserialize, Serialize};

use super::sample::LocationSample;

/// Opaque vehicle identifier.
///
/// Distinct from the human-facing plate label: ids are stable keys for the
/// registry and event stream, labels are display text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub String);

impl VehicleId {
    /// Create a new vehicle id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a route assignment (owned by the external route planner).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteId(pub String);

impl RouteId {
    /// Create a new route id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operating mode of a vehicle.
///
/// Mode is explicit state set by operators (or by the emergency path);
/// it is distinct from [`super::VehicleStatus`], which is always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleMode {
    /// In service and eligible for tracking.
    Active,
    /// Out of service.
    Inactive,
    /// In the workshop.
    Maintenance,
    /// Emergency declared; tracking halted until restarted.
    Emergency,
}

impl std::fmt::Display for VehicleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VehicleMode::Active => "active",
            VehicleMode::Inactive => "inactive",
            VehicleMode::Maintenance => "maintenance",
            VehicleMode::Emergency => "emergency",
        };
        write!(f, "{}", s)
    }
}

/// Canonical state of one fleet vehicle.
///
/// Created at registry seeding and never deleted in-session. Mode changes
/// only via explicit calls; the latest sample pointer is updated by the
/// tracking engine on every append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Stable identifier.
    pub id: VehicleId,
    /// Human-facing plate or label.
    pub label: String,
    /// Current route assignment, if any.
    pub route: Option<RouteId>,
    /// Seating capacity.
    pub capacity: u32,
    /// Current passenger count.
    pub passengers: u32,
    /// Operating mode.
    pub mode: VehicleMode,
    /// Most recent location sample, if any has been recorded.
    pub last_sample: Option<LocationSample>,
}

impl Vehicle {
    /// Create a new vehicle in the given mode with no route and no history.
    pub fn new(id: impl Into<VehicleId>, label: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            route: None,
            capacity,
            passengers: 0,
            mode: VehicleMode::Active,
            last_sample: None,
        }
    }

    /// Set the operating mode (builder form, used at seeding).
    pub fn with_mode(mut self, mode: VehicleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Assign a route (builder form, used at seeding).
    pub fn with_route(mut self, route: RouteId) -> Self {
        self.route = Some(route);
        self
    }

    /// Set the passenger count (builder form, used at seeding).
    pub fn with_passengers(mut self, passengers: u32) -> Self {
        self.passengers = passengers;
        self
    }

    /// Whether this vehicle currently has a route assignment.
    pub fn has_route(&self) -> bool {
        self.route.is_some()
    }
}

impl From<String> for VehicleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
