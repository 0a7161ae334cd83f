//! Typed events and single-subscriber dispatch.
//!
//! The engine emits [`LocationEvent`]s to at most one registered
//! [`EventSubscriber`]. Dispatch happens inside the coordinator's exclusive
//! section, so the subscriber observes events in exactly the order they were
//! generated — one serialization point, no concurrent reordering.
//!
//! With no subscriber set, events are dropped: not queued, not an error.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::trace;

use crate::auth::AuthorizationStatus;
use crate::location::Location;
use crate::region::Region;
use crate::service::LocationError;

/// An event delivered to the subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LocationEvent {
    /// A new position fix was accepted.
    LocationUpdated(Location),
    /// The sensor observed entry into a monitored region.
    RegionEntered(Region),
    /// The sensor observed exit from a monitored region, or an expired
    /// geofence was removed while the device was last known inside it.
    RegionExited(Region),
    /// The authorization status changed.
    AuthorizationChanged(AuthorizationStatus),
    /// Monitoring failed; carries the failure kind.
    MonitoringFailed(LocationError),
}

/// Receiver of engine events.
///
/// Callbacks run inside the engine's exclusive section: implementations must
/// return promptly and must not call back into the service, or dispatch
/// ordering guarantees turn into a deadlock.
pub trait EventSubscriber: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: LocationEvent);
}

/// Single-subscriber fan-out point.
///
/// The subscriber slot is replaceable at any time; the read at dispatch time
/// is atomic with respect to [`EventDispatcher::set_subscriber`].
#[derive(Default)]
pub struct EventDispatcher {
    subscriber: RwLock<Option<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcher {
    /// Create a dispatcher with no subscriber.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install, replace, or clear the subscriber.
    pub fn set_subscriber(&self, subscriber: Option<Arc<dyn EventSubscriber>>) {
        *self.subscriber.write() = subscriber;
    }

    /// Whether a subscriber is currently installed.
    pub fn has_subscriber(&self) -> bool {
        self.subscriber.read().is_some()
    }

    /// Deliver an event to the current subscriber, dropping it if none.
    pub fn dispatch(&self, event: LocationEvent) {
        let subscriber = self.subscriber.read().clone();
        match subscriber {
            Some(subscriber) => subscriber.on_event(event),
            None => trace!(?event, "no subscriber, event dropped"),
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("has_subscriber", &self.has_subscriber())
            .finish()
    }
}

/// Subscriber that records every event it receives.
///
/// Exposed for integration tests and demos; production subscribers live in
/// the host application.
#[derive(Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<LocationEvent>>,
}

impl RecordingSubscriber {
    /// Create an empty recorder.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything received so far, in dispatch order.
    pub fn events(&self) -> Vec<LocationEvent> {
        self.events.lock().clone()
    }

    /// Drain and return the received events.
    pub fn take_events(&self) -> Vec<LocationEvent> {
        std::mem::take(&mut self.events.lock())
    }

    /// Number of events received.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSubscriber for RecordingSubscriber {
    fn on_event(&self, event: LocationEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;

    fn fix_event() -> LocationEvent {
        LocationEvent::LocationUpdated(Location::new(40.0, -73.9, 10.0))
    }

    #[test]
    fn test_dispatch_without_subscriber_drops_event() {
        let dispatcher = EventDispatcher::new();
        // Must not panic, queue, or error
        dispatcher.dispatch(fix_event());
        assert!(!dispatcher.has_subscriber());
    }

    #[test]
    fn test_dispatch_reaches_subscriber_in_order() {
        let dispatcher = EventDispatcher::new();
        let recorder = RecordingSubscriber::new();
        dispatcher.set_subscriber(Some(recorder.clone()));

        let first = fix_event();
        let second = LocationEvent::AuthorizationChanged(AuthorizationStatus::Always);
        dispatcher.dispatch(first.clone());
        dispatcher.dispatch(second.clone());

        assert_eq!(recorder.events(), vec![first, second]);
    }

    #[test]
    fn test_replacing_subscriber_redirects_events() {
        let dispatcher = EventDispatcher::new();
        let first = RecordingSubscriber::new();
        let second = RecordingSubscriber::new();

        dispatcher.set_subscriber(Some(first.clone()));
        dispatcher.dispatch(fix_event());

        dispatcher.set_subscriber(Some(second.clone()));
        dispatcher.dispatch(fix_event());

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_clearing_subscriber_stops_delivery() {
        let dispatcher = EventDispatcher::new();
        let recorder = RecordingSubscriber::new();

        dispatcher.set_subscriber(Some(recorder.clone()));
        dispatcher.dispatch(fix_event());
        dispatcher.set_subscriber(None);
        dispatcher.dispatch(fix_event());

        assert_eq!(recorder.len(), 1);
    }
}
