//! Map presenter - bridges tracking events and the routing collaborator
//! onto a rendering surface.
//!
//! The engine does not render anything itself: a [`MarkerSurface`] is the
//! seam to whatever map widget the host application uses. The presenter
//! subscribes to the event bus and forwards location updates as marker
//! moves, and runs path-animation sessions that step a marker along a
//! planned route.
//!
//! # Overlay lifecycle
//!
//! The presenter owns every overlay it creates: an overlay is cleared when
//! its session completes, is cancelled, or is replaced by a new session
//! for the same vehicle. A routing failure ends only the affected session
//! and is surfaced through [`MarkerSurface::show_route_failure`] - the
//! surface always learns why there is no route to draw, never a frozen
//! view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::{EventBus, SubscriberId};
use crate::geo::GeoPoint;
use crate::model::{TrackingEvent, VehicleId};
use crate::routing::{PlannedRoute, RoutePlanner, RoutingError};

/// Identifier of a drawn route overlay, allocated by the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// Rendering surface accepting marker and overlay updates.
///
/// Implementations are expected to be cheap and non-blocking; they are
/// called from the engine's tasks.
pub trait MarkerSurface: Send + Sync {
    /// Move a vehicle's marker to a position.
    fn move_marker(&self, vehicle: &VehicleId, position: GeoPoint);

    /// Draw a route overlay for a vehicle.
    fn draw_route(&self, vehicle: &VehicleId, overlay: OverlayId, polyline: &[GeoPoint]);

    /// Remove a previously drawn overlay.
    ///
    /// May be called more than once for the same overlay (a completed
    /// session clears its own overlay; reaping the session entry clears
    /// again). Implementations must treat unknown ids as a no-op.
    fn clear_route(&self, overlay: OverlayId);

    /// Present a visible routing failure state for a vehicle.
    fn show_route_failure(&self, vehicle: &VehicleId, error: &RoutingError);
}

/// Configuration for the presenter.
#[derive(Debug, Clone)]
pub struct PresenterConfig {
    /// Animation time is divided by this factor: 1.0 animates at the
    /// route's real expected pace, 60.0 compresses a minute into a second.
    pub speed_factor: f64,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self { speed_factor: 1.0 }
    }
}

/// One live path-animation session.
struct AnimationSession {
    token: CancellationToken,
    handle: JoinHandle<()>,
    overlay: OverlayId,
}

/// Subscribes to tracking events and animates markers on a surface.
pub struct MapPresenter {
    surface: Arc<dyn MarkerSurface>,
    planner: Arc<dyn RoutePlanner>,
    bus: Arc<EventBus>,
    config: PresenterConfig,
    subscriber_id: SubscriberId,
    sessions: Mutex<HashMap<VehicleId, AnimationSession>>,
    next_overlay: AtomicU64,
}

impl MapPresenter {
    /// Create a presenter over a surface, planner, and event bus.
    pub fn new(
        surface: Arc<dyn MarkerSurface>,
        planner: Arc<dyn RoutePlanner>,
        bus: Arc<EventBus>,
        config: PresenterConfig,
    ) -> Self {
        Self {
            surface,
            planner,
            bus,
            config,
            subscriber_id: SubscriberId::new("map-presenter"),
            sessions: Mutex::new(HashMap::new()),
            next_overlay: AtomicU64::new(1),
        }
    }

    /// Subscribe to the bus: every location update moves that vehicle's
    /// marker.
    pub fn attach(&self) {
        let surface = Arc::clone(&self.surface);
        self.bus.subscribe(
            self.subscriber_id.clone(),
            Arc::new(move |event| {
                if let TrackingEvent::LocationUpdate {
                    vehicle_id, sample, ..
                } = event
                {
                    surface.move_marker(vehicle_id, sample.position());
                }
            }),
        );
        debug!("presenter attached to event bus");
    }

    /// Unsubscribe from the bus and cancel every animation session.
    pub async fn detach(&self) {
        self.bus.unsubscribe(&self.subscriber_id);

        let sessions: Vec<(VehicleId, AnimationSession)> =
            self.sessions.lock().drain().collect();
        for (vehicle, session) in sessions {
            Self::end_session(&self.surface, vehicle, session).await;
        }
        debug!("presenter detached");
    }

    /// Run a path-animation session for a vehicle.
    ///
    /// Plans the route, draws the overlay, then steps the marker along the
    /// polyline paced by the route's expected duration. Replaces (and
    /// clears) any prior session for the same vehicle. A planning failure
    /// is surfaced on the rendering surface and ends the session.
    pub async fn animate_route(
        &self,
        vehicle: &VehicleId,
        stops: &[GeoPoint],
    ) -> Result<(), RoutingError> {
        let route = match self.planner.plan(stops).await {
            Ok(route) => route,
            Err(e) => {
                warn!(vehicle = %vehicle, error = %e, "route planning failed");
                self.surface.show_route_failure(vehicle, &e);
                return Err(e);
            }
        };

        // Replace any prior session before drawing the new overlay
        self.stop_animation(vehicle).await;

        let overlay = OverlayId(self.next_overlay.fetch_add(1, Ordering::Relaxed));
        self.surface.draw_route(vehicle, overlay, &route.polyline);

        let token = CancellationToken::new();
        let handle = tokio::spawn(animate_session(
            Arc::clone(&self.surface),
            vehicle.clone(),
            overlay,
            route,
            self.config.speed_factor,
            token.clone(),
        ));

        info!(vehicle = %vehicle, "path animation started");
        self.sessions.lock().insert(
            vehicle.clone(),
            AnimationSession {
                token,
                handle,
                overlay,
            },
        );
        Ok(())
    }

    /// Cancel a vehicle's animation session, if any. Returns whether one
    /// was live.
    pub async fn stop_animation(&self, vehicle: &VehicleId) -> bool {
        let session = self.sessions.lock().remove(vehicle);
        match session {
            Some(session) => {
                Self::end_session(&self.surface, vehicle.clone(), session).await;
                true
            }
            None => false,
        }
    }

    async fn end_session(
        surface: &Arc<dyn MarkerSurface>,
        vehicle: VehicleId,
        session: AnimationSession,
    ) {
        session.token.cancel();
        if session.handle.await.is_err() {
            warn!(vehicle = %vehicle, "animation task panicked");
        }
        surface.clear_route(session.overlay);
    }
}

/// Step a marker along a polyline, then clear the overlay.
///
/// Pacing divides the route's total expected duration evenly across the
/// polyline segments; cancellation is observed between steps.
async fn animate_session(
    surface: Arc<dyn MarkerSurface>,
    vehicle: VehicleId,
    overlay: OverlayId,
    route: PlannedRoute,
    speed_factor: f64,
    token: CancellationToken,
) {
    let segments = route.polyline.len().saturating_sub(1).max(1);
    let step = route
        .total_duration()
        .div_f64(segments as f64)
        .div_f64(speed_factor.max(f64::MIN_POSITIVE));

    for point in &route.polyline {
        surface.move_marker(&vehicle, *point);

        if step > Duration::ZERO {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(step) => {}
            }
        } else if token.is_cancelled() {
            break;
        }
    }

    // Session over (completed or cancelled): the overlay goes with it
    surface.clear_route(overlay);
    debug!(vehicle = %vehicle, "path animation finished");
}
