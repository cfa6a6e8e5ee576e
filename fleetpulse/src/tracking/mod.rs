//! Tracking engine - per-vehicle timers, sample ingestion, status
//! classification, and event publication.
//!
//! # Architecture
//!
//! ```text
//! ticker task (per vehicle) ──Tick──►┐
//! ticker task (per vehicle) ──Tick──►│
//!                                    ▼
//! TrackingService ──commands──► TrackerDaemon ──► registry append
//!                  ◄──acks────       │             classifier
//!                                    └───────────► event bus
//! ```
//!
//! One daemon task owns all tick-path state and drains a single command
//! channel, so per-vehicle append + classify + publish is serialized.
//! Ticker tasks are trivial interval loops that only send `Tick` messages
//! and exit on cancellation. Control commands carry oneshot acks: when
//! `stop_tracking` returns, the ticker has been joined and the vehicle
//! untracked, so no further tick for it can be observed.

mod daemon;
mod error;
mod service;

pub use daemon::{TrackerCommand, TrackerDaemon};
pub use error::TrackingError;
pub use service::TrackingService;
