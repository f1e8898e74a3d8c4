//! Tracing-backed event sink
//!
//! Default observer that renders every lifecycle event through `tracing`.
//! Remembers the service identifier from the `Initial` event so later log
//! lines can be attributed to their dispatcher.

use std::sync::Mutex;

use tracing::{debug, error};

use super::{Event, EventSink};
use crate::response::BodyExt;

const TARGET: &str = "relay_net::events";

/// [`EventSink`] that logs through the `tracing` ecosystem
#[derive(Debug, Default)]
pub struct TracingSink {
    identifier: Mutex<Option<String>>,
}

impl TracingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn identifier(&self) -> String {
        self.identifier
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
            .unwrap_or_default()
    }
}

impl EventSink for TracingSink {
    fn handle(&self, event: &Event) {
        match event {
            Event::Initial(id) => {
                let mut guard =
                    self.identifier.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                if guard.is_none() {
                    *guard = Some(id.clone());
                }
                debug!(target: TARGET, service = %id, "service initialized");
            }
            Event::RequestSent(snapshot) => {
                debug!(
                    target: TARGET,
                    service = %self.identifier(),
                    endpoint = %snapshot.endpoint,
                    curl = %snapshot.curl(),
                    "request sent"
                );
            }
            Event::ResponseReceived(snapshot) => {
                debug!(
                    target: TARGET,
                    service = %self.identifier(),
                    endpoint = %snapshot.request.endpoint,
                    status = snapshot.status,
                    body = %snapshot.body.pretty_json(),
                    "response received"
                );
            }
            Event::Error(err) => {
                error!(target: TARGET, service = %self.identifier(), error = %err, "request failed");
            }
            Event::Custom(message) => {
                debug!(target: TARGET, service = %self.identifier(), message = %message, "custom event");
            }
        }
    }
}
