//! Tracker daemon - the single owner of all tick-path state.
//!
//! The daemon is a long-running task that drains one command channel.
//! Everything that mutates tracking state (timer spawn/cancel, sample
//! append, status bookkeeping, event publication) happens inside it, so a
//! vehicle's tick is processed atomically with respect to every other
//! command.
//!
//! Ticker tasks use `try_send` for their `Tick` messages: a tick that
//! finds the channel full is dropped, never queued behind a join the
//! daemon is awaiting. Under sustained pressure the engine degrades to a
//! slower cadence instead of deadlocking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::bus::EventBus;
use crate::classifier::classify;
use crate::config::ClassifierConfig;
use crate::model::{EmergencyKind, TrackingEvent, VehicleId, VehicleMode, VehicleStatus};
use crate::registry::VehicleRegistry;
use crate::simulator::SampleSource;

use super::error::TrackingError;

/// Commands processed by the tracker daemon.
#[derive(Debug)]
pub enum TrackerCommand {
    /// Begin (or restart) periodic tracking for a vehicle.
    Start {
        id: VehicleId,
        period: Duration,
        ack: oneshot::Sender<Result<(), TrackingError>>,
    },
    /// Stop periodic tracking for a vehicle. No-op if untracked.
    Stop {
        id: VehicleId,
        ack: oneshot::Sender<Result<(), TrackingError>>,
    },
    /// Start tracking every currently-active vehicle. Acks the count
    /// of vehicles started.
    StartAll {
        period: Duration,
        ack: oneshot::Sender<usize>,
    },
    /// Stop every live timer. Acks the count of vehicles stopped.
    StopAll { ack: oneshot::Sender<usize> },
    /// Declare an emergency: set mode, halt tracking, publish.
    Emergency {
        id: VehicleId,
        kind: EmergencyKind,
        ack: oneshot::Sender<Result<(), TrackingError>>,
    },
    /// One scheduled tick for a tracked vehicle (sent by ticker tasks).
    Tick { id: VehicleId },
}

/// A live per-vehicle timer.
struct Ticker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// The tracking engine daemon.
///
/// Owns the timer map and the previous-status map; receives commands from
/// [`super::TrackingService`] handles and from ticker tasks. Runs as a
/// long-lived background task until the shutdown token fires, then joins
/// every ticker before exiting.
pub struct TrackerDaemon {
    registry: Arc<VehicleRegistry>,
    bus: Arc<EventBus>,
    source: Arc<dyn SampleSource>,
    classifier: ClassifierConfig,

    rx: mpsc::Receiver<TrackerCommand>,
    /// Cloned into ticker tasks so their ticks land on the same channel.
    tx: mpsc::Sender<TrackerCommand>,

    tickers: HashMap<VehicleId, Ticker>,
    /// Status observed at each vehicle's previous tick, for change
    /// detection. Emergency is the only path that records `Problem` here.
    last_status: HashMap<VehicleId, VehicleStatus>,
}

impl TrackerDaemon {
    /// Create a daemon and the command channel endpoints.
    ///
    /// Returns the daemon plus the sender used by service handles.
    pub fn new(
        channel_capacity: usize,
        registry: Arc<VehicleRegistry>,
        bus: Arc<EventBus>,
        source: Arc<dyn SampleSource>,
        classifier: ClassifierConfig,
    ) -> (Self, mpsc::Sender<TrackerCommand>) {
        let (tx, rx) = mpsc::channel(channel_capacity);
        let daemon = Self {
            registry,
            bus,
            source,
            classifier,
            rx,
            tx: tx.clone(),
            tickers: HashMap::new(),
            last_status: HashMap::new(),
        };
        (daemon, tx)
    }

    /// Run the daemon until `shutdown` fires or every sender is dropped.
    ///
    /// On exit, cancels and joins every ticker: after this returns, no
    /// timer for any vehicle is live.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Tracker daemon started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Tracker daemon received shutdown");
                    break;
                }
                command = self.rx.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }

        let stopped = self.halt_all_timers().await;
        info!(timers_stopped = stopped, "Tracker daemon stopped");
    }

    async fn handle(&mut self, command: TrackerCommand) {
        match command {
            TrackerCommand::Start { id, period, ack } => {
                let result = self.start_timer(&id, period).await;
                let _ = ack.send(result);
            }
            TrackerCommand::Stop { id, ack } => {
                if self.halt_timer(&id).await {
                    self.bus.publish(&TrackingEvent::TrackingStopped {
                        vehicle_id: id,
                        timestamp: Utc::now(),
                    });
                }
                let _ = ack.send(Ok(()));
            }
            TrackerCommand::StartAll { period, ack } => {
                let mut started = 0;
                for vehicle in self.registry.list() {
                    if vehicle.mode == VehicleMode::Active
                        && self.start_timer(&vehicle.id, period).await.is_ok()
                    {
                        started += 1;
                    }
                }
                let _ = ack.send(started);
            }
            TrackerCommand::StopAll { ack } => {
                let ids: Vec<VehicleId> = self.tickers.keys().cloned().collect();
                let mut stopped = 0;
                for id in ids {
                    if self.halt_timer(&id).await {
                        self.bus.publish(&TrackingEvent::TrackingStopped {
                            vehicle_id: id,
                            timestamp: Utc::now(),
                        });
                        stopped += 1;
                    }
                }
                let _ = ack.send(stopped);
            }
            TrackerCommand::Emergency { id, kind, ack } => {
                let result = self.declare_emergency(&id, kind).await;
                let _ = ack.send(result);
            }
            TrackerCommand::Tick { id } => self.process_tick(&id),
        }
    }

    /// Spawn a ticker for a vehicle, cancelling any prior one first so a
    /// repeated start leaves exactly one live timer.
    async fn start_timer(
        &mut self,
        id: &VehicleId,
        period: Duration,
    ) -> Result<(), TrackingError> {
        let vehicle = self.registry.get(id)?;
        if vehicle.mode != VehicleMode::Active {
            return Err(TrackingError::InvalidTransition {
                id: id.clone(),
                mode: vehicle.mode,
            });
        }

        if self.halt_timer(id).await {
            debug!(vehicle = %id, "restarting tracking; prior timer cancelled");
        }

        // tokio intervals reject a zero period
        let period = period.max(Duration::from_millis(1));

        let token = CancellationToken::new();
        let handle = tokio::spawn(ticker_loop(
            id.clone(),
            period,
            self.tx.clone(),
            token.clone(),
        ));
        self.tickers.insert(id.clone(), Ticker { token, handle });

        info!(vehicle = %id, period_ms = period.as_millis() as u64, "tracking started");
        self.bus.publish(&TrackingEvent::TrackingStarted {
            vehicle_id: id.clone(),
            period,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Cancel and join a vehicle's ticker. Returns whether one was live.
    async fn halt_timer(&mut self, id: &VehicleId) -> bool {
        match self.tickers.remove(id) {
            Some(ticker) => {
                ticker.token.cancel();
                if ticker.handle.await.is_err() {
                    warn!(vehicle = %id, "ticker task panicked");
                }
                info!(vehicle = %id, "tracking stopped");
                true
            }
            None => false,
        }
    }

    async fn halt_all_timers(&mut self) -> usize {
        let ids: Vec<VehicleId> = self.tickers.keys().cloned().collect();
        let mut stopped = 0;
        for id in ids {
            if self.halt_timer(&id).await {
                stopped += 1;
            }
        }
        stopped
    }

    /// Process one tick: generate, append, classify, publish.
    fn process_tick(&mut self, id: &VehicleId) {
        // A tick queued before its timer was stopped is stale; drop it
        if !self.tickers.contains_key(id) {
            trace!(vehicle = %id, "dropping stale tick");
            return;
        }

        let vehicle = match self.registry.get(id) {
            Ok(vehicle) => vehicle,
            Err(e) => {
                warn!(vehicle = %id, error = %e, "tick for unregistered vehicle");
                return;
            }
        };
        if vehicle.mode != VehicleMode::Active {
            trace!(vehicle = %id, mode = %vehicle.mode, "skipping tick for non-active vehicle");
            return;
        }

        let now = Utc::now();
        let sample = self.source.next_sample(&vehicle, now);
        let snapshot = match self.registry.append_sample(id, sample) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(vehicle = %id, error = %e, "failed to append sample");
                return;
            }
        };

        let status = classify(
            &snapshot.vehicle,
            &snapshot.latest,
            snapshot.previous.as_ref(),
            now,
            &self.classifier,
        );

        let previous_status = self.last_status.insert(id.clone(), status);
        if let Some(previous) = previous_status {
            if previous != status {
                debug!(vehicle = %id, from = %previous, to = %status, "status changed");
                self.bus.publish(&TrackingEvent::StatusChange {
                    vehicle_id: id.clone(),
                    previous,
                    current: status,
                    timestamp: now,
                });
            }
        }

        self.bus.publish(&TrackingEvent::LocationUpdate {
            vehicle_id: id.clone(),
            sample: snapshot.latest,
            status,
            timestamp: now,
        });
    }

    /// Declare an emergency: mode, timer halt, then the emergency event.
    ///
    /// Runs synchronously with respect to the caller's ack - the emergency
    /// bypasses the periodic cadence entirely.
    async fn declare_emergency(
        &mut self,
        id: &VehicleId,
        kind: EmergencyKind,
    ) -> Result<(), TrackingError> {
        self.registry.set_mode(id, VehicleMode::Emergency)?;
        self.halt_timer(id).await;
        self.last_status.insert(id.clone(), VehicleStatus::Problem);

        let vehicle = self.registry.get(id)?;
        warn!(vehicle = %id, kind = %kind, "emergency declared");
        self.bus.publish(&TrackingEvent::Emergency {
            vehicle_id: id.clone(),
            kind,
            location: vehicle.last_sample,
            passengers: vehicle.passengers,
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

/// Per-vehicle interval loop. Sends `Tick` messages until cancelled.
///
/// The first tick fires immediately, so a freshly started vehicle emits
/// its first sample without waiting a full period.
async fn ticker_loop(
    id: VehicleId,
    period: Duration,
    tx: mpsc::Sender<TrackerCommand>,
    token: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                match tx.try_send(TrackerCommand::Tick { id: id.clone() }) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        // Daemon is behind; drop this tick rather than queue
                        trace!(vehicle = %id, "command channel full, tick dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        }
    }
}
