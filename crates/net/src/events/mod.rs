//! Lifecycle events and the fan-out bus
//!
//! Every numbered step of the dispatch pipeline emits an [`Event`] as a side
//! notification, independent of the main return path. Delivery is synchronous
//! and in registration order, so sinks must be fast or offload internally.

pub mod logger;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use crate::error::NetworkError;
use crate::response::{RequestSnapshot, ResponseSnapshot};

/// Lifecycle event fanned out to every registered sink
///
/// Constructed once and delivered by shared reference; sinks cannot mutate it.
#[derive(Debug, Clone)]
pub enum Event {
    /// Dispatcher construction, carrying the configured identifier
    Initial(String),
    /// A wire request went out
    RequestSent(RequestSnapshot),
    /// A classifiable response came back
    ResponseReceived(ResponseSnapshot),
    /// A terminal or transport-level failure
    Error(NetworkError),
    /// Free-form notification for secondary information
    Custom(String),
}

/// Capability implemented by lifecycle observers
pub trait EventSink: Send + Sync {
    /// Receive one event. Delivery happens on the request path; offload
    /// anything slow.
    fn handle(&self, event: &Event);
}

/// Ordered fan-out notifier
///
/// Holds the registered sinks for the lifetime of the dispatcher. A sink that
/// panics is isolated: the panic is caught, logged, and delivery continues
/// with the next sink. No event is dropped or queued.
#[derive(Clone, Default)]
pub struct EventBus {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventBus {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    /// Deliver `event` to every sink in registration order.
    pub fn notify(&self, event: &Event) {
        for sink in &self.sinks {
            let delivery = catch_unwind(AssertUnwindSafe(|| sink.handle(event)));
            if delivery.is_err() {
                warn!("event sink panicked during delivery; continuing with remaining sinks");
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("sinks", &self.sinks.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl EventSink for Recorder {
        fn handle(&self, event: &Event) {
            let kind = match event {
                Event::Initial(_) => "initial",
                Event::RequestSent(_) => "request",
                Event::ResponseReceived(_) => "response",
                Event::Error(_) => "error",
                Event::Custom(_) => "custom",
            };
            self.log.lock().unwrap().push(format!("{}:{kind}", self.name));
        }
    }

    struct Panicking;

    impl EventSink for Panicking {
        fn handle(&self, _event: &Event) {
            panic!("observer failure");
        }
    }

    #[test]
    fn delivers_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new(vec![
            Arc::new(Recorder { name: "first", log: log.clone() }),
            Arc::new(Recorder { name: "second", log: log.clone() }),
        ]);

        bus.notify(&Event::Custom("hello".into()));

        assert_eq!(*log.lock().unwrap(), vec!["first:custom", "second:custom"]);
    }

    #[test]
    fn panicking_sink_does_not_block_later_sinks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new(vec![
            Arc::new(Panicking),
            Arc::new(Recorder { name: "survivor", log: log.clone() }),
        ]);

        bus.notify(&Event::Initial("svc".into()));

        assert_eq!(*log.lock().unwrap(), vec!["survivor:initial"]);
    }

    #[test]
    fn empty_bus_is_a_no_op() {
        let bus = EventBus::default();
        assert!(bus.is_empty());
        bus.notify(&Event::Custom("ignored".into()));
    }
}
