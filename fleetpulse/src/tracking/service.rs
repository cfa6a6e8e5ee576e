//! Tracking service handle - the caller-facing side of the daemon.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::model::{EmergencyKind, VehicleId};

use super::daemon::TrackerCommand;
use super::error::TrackingError;

/// Cloneable handle to the tracker daemon.
///
/// Every operation is acked by the daemon before the call returns, so the
/// completion guarantees hold at the call site: after `stop_tracking`
/// returns, no further tick for that vehicle will be processed.
#[derive(Clone)]
pub struct TrackingService {
    tx: mpsc::Sender<TrackerCommand>,
    default_period: Duration,
}

impl TrackingService {
    /// Create a handle over the daemon's command channel.
    pub fn new(tx: mpsc::Sender<TrackerCommand>, default_period: Duration) -> Self {
        Self { tx, default_period }
    }

    /// The tick period used by [`Self::start_all`].
    pub fn default_period(&self) -> Duration {
        self.default_period
    }

    /// Begin periodic tracking for a vehicle.
    ///
    /// Fails with `NotFound` for unknown ids and `InvalidTransition` for
    /// vehicles that are not active. Restarting a tracked vehicle first
    /// cancels its prior timer - there is never more than one live timer
    /// per vehicle.
    pub async fn start_tracking(
        &self,
        id: &VehicleId,
        period: Duration,
    ) -> Result<(), TrackingError> {
        let (ack, response) = oneshot::channel();
        self.send(TrackerCommand::Start {
            id: id.clone(),
            period,
            ack,
        })
        .await?;
        response.await.map_err(|_| TrackingError::Shutdown)?
    }

    /// Stop periodic tracking for a vehicle. No-op if untracked.
    pub async fn stop_tracking(&self, id: &VehicleId) -> Result<(), TrackingError> {
        let (ack, response) = oneshot::channel();
        self.send(TrackerCommand::Stop { id: id.clone(), ack }).await?;
        response.await.map_err(|_| TrackingError::Shutdown)?
    }

    /// Start tracking every currently-active vehicle at the default
    /// period. Returns the number of vehicles started.
    pub async fn start_all(&self) -> Result<usize, TrackingError> {
        self.start_all_with_period(self.default_period).await
    }

    /// Start tracking every currently-active vehicle at the given period.
    pub async fn start_all_with_period(&self, period: Duration) -> Result<usize, TrackingError> {
        let (ack, response) = oneshot::channel();
        self.send(TrackerCommand::StartAll { period, ack }).await?;
        response.await.map_err(|_| TrackingError::Shutdown)
    }

    /// Stop every live timer. Returns the number of vehicles stopped.
    pub async fn stop_all(&self) -> Result<usize, TrackingError> {
        let (ack, response) = oneshot::channel();
        self.send(TrackerCommand::StopAll { ack }).await?;
        response.await.map_err(|_| TrackingError::Shutdown)
    }

    /// Declare an emergency for a vehicle.
    ///
    /// Synchronous with respect to the returned future: when this
    /// completes, the vehicle's mode is `Emergency`, its timer is halted,
    /// and the emergency event has been published.
    pub async fn trigger_emergency(
        &self,
        id: &VehicleId,
        kind: EmergencyKind,
    ) -> Result<(), TrackingError> {
        let (ack, response) = oneshot::channel();
        self.send(TrackerCommand::Emergency {
            id: id.clone(),
            kind,
            ack,
        })
        .await?;
        response.await.map_err(|_| TrackingError::Shutdown)?
    }

    async fn send(&self, command: TrackerCommand) -> Result<(), TrackingError> {
        self.tx.send(command).await.map_err(|_| TrackingError::Shutdown)
    }
}

impl std::fmt::Debug for TrackingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingService")
            .field("default_period", &self.default_period)
            .finish()
    }
}
