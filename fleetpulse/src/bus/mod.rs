//! Event bus - in-process publish/subscribe fan-out.
//!
//! Delivery contract:
//!
//! - `publish` invokes every registered callback synchronously, in
//!   registration order, on the publisher's task.
//! - A panicking callback is caught and logged; delivery continues to the
//!   remaining subscribers (isolation contract).
//! - No queueing, no replay: a subscriber only sees events published while
//!   it is registered.
//!
//! The subscriber list is snapshotted before dispatch, so callbacks may
//! freely subscribe/unsubscribe from inside a delivery without deadlocking.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::model::TrackingEvent;

/// Identifier for a subscription, chosen by the subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub String);

impl SubscriberId {
    /// Create a new subscriber id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubscriberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Callback invoked for every published event.
pub type EventCallback = Arc<dyn Fn(&TrackingEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriberId,
    callback: EventCallback,
}

/// In-process publish/subscribe fan-out for tracking events.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under the given id.
    ///
    /// Re-subscribing an existing id replaces its callback in place,
    /// keeping its position in the delivery order.
    pub fn subscribe(&self, id: SubscriberId, callback: EventCallback) {
        let mut subscribers = self.subscribers.lock();
        match subscribers.iter_mut().find(|s| s.id == id) {
            Some(existing) => existing.callback = callback,
            None => subscribers.push(Subscriber { id, callback }),
        }
    }

    /// Remove a subscription. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: &SubscriberId) {
        self.subscribers.lock().retain(|s| &s.id != id);
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver an event to every subscriber registered right now.
    ///
    /// Callbacks run synchronously in registration order. A panic in one
    /// callback is caught and logged; the remaining subscribers still
    /// receive the event.
    pub fn publish(&self, event: &TrackingEvent) {
        let snapshot: Vec<(SubscriberId, EventCallback)> = self
            .subscribers
            .lock()
            .iter()
            .map(|s| (s.id.clone(), Arc::clone(&s.callback)))
            .collect();

        for (id, callback) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                warn!(subscriber = %id, "subscriber callback panicked; delivery continues");
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
