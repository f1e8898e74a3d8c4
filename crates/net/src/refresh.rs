//! Coordinated credential refresh
//!
//! [`RefreshCoordinator`] serializes concurrent refresh attempts into one
//! underlying call against the refresh endpoint, shares the outcome with every
//! waiter, and enforces a cooldown so refresh storms collapse into a single
//! network call. The reference back to the dispatcher core is weak: the
//! coordinator never keeps the dispatcher alive.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::dispatch::DispatcherCore;
use crate::endpoint::Endpoint;
use crate::error::{NetworkError, Result};

/// Receiving half of the refresh-result stream
///
/// Every successful refresh payload is delivered here exactly once,
/// independent of which request triggered it. The buffer is unbounded; the
/// producer never blocks, and payloads sent while no receiver exists are
/// dropped.
pub type RefreshStream = mpsc::UnboundedReceiver<Vec<u8>>;

/// Configuration for the refresh subsystem
///
/// Immutable after construction. `new` applies the defaults: trigger status
/// 401 and a one second cooldown.
#[derive(Clone)]
pub struct RefreshOptions {
    pub(crate) endpoint: Arc<dyn Endpoint>,
    pub(crate) trigger_status: u16,
    pub(crate) cooldown: Duration,
}

impl RefreshOptions {
    #[must_use]
    pub fn new(endpoint: impl Endpoint + 'static) -> Self {
        Self { endpoint: Arc::new(endpoint), trigger_status: 401, cooldown: Duration::from_secs(1) }
    }

    /// Status code that triggers a refresh-then-retry (default 401).
    #[must_use]
    pub fn trigger_status(mut self, status: u16) -> Self {
        self.trigger_status = status;
        self
    }

    /// Interval enforced after a successful refresh before control returns
    /// and before the next underlying call may fire.
    #[must_use]
    pub fn cooldown(mut self, interval: Duration) -> Self {
        self.cooldown = interval;
        self
    }
}

impl fmt::Debug for RefreshOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshOptions")
            .field("endpoint", &crate::endpoint::label(self.endpoint.as_ref()))
            .field("trigger_status", &self.trigger_status)
            .field("cooldown", &self.cooldown)
            .finish()
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Result<Vec<u8>>>>;

#[derive(Default)]
struct RefreshState {
    /// The single in-flight refresh, if any. Checked and set under one lock
    /// so two underlying calls can never start concurrently.
    inflight: Option<SharedRefresh>,
    /// End of the cooldown window opened by the last successful refresh.
    cooldown_until: Option<Instant>,
}

/// Single-flight engine behind the dispatcher's retry path
pub(crate) struct RefreshCoordinator {
    core: Weak<DispatcherCore>,
    options: RefreshOptions,
    state: Arc<Mutex<RefreshState>>,
    results: mpsc::UnboundedSender<Vec<u8>>,
}

impl RefreshCoordinator {
    pub(crate) fn new(core: Weak<DispatcherCore>, options: RefreshOptions) -> (Self, RefreshStream) {
        let (results, stream) = mpsc::unbounded_channel();
        let coordinator =
            Self { core, options, state: Arc::new(Mutex::new(RefreshState::default())), results };
        (coordinator, stream)
    }

    pub(crate) fn trigger_status(&self) -> u16 {
        self.options.trigger_status
    }

    /// Refresh credentials, coalescing with any in-flight attempt.
    ///
    /// Joiners receive the shared outcome of the in-flight call; the first
    /// caller launches a new one. On success every caller sleeps the cooldown
    /// before control returns.
    ///
    /// # Errors
    /// [`NetworkError::InvalidCredentials`] when the underlying call fails or
    /// the dispatcher is gone; the coordinator never retries internally.
    pub(crate) async fn refresh(&self) -> Result<Vec<u8>> {
        let shared = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(inflight) = state.inflight.clone() {
                debug!("joining in-flight credential refresh");
                inflight
            } else {
                let delay = state
                    .cooldown_until
                    .map(|until| until.saturating_duration_since(Instant::now()))
                    .unwrap_or_default();
                if !delay.is_zero() {
                    debug!(?delay, "delaying refresh inside cooldown window");
                }
                let launched = self.launch(delay);
                state.inflight = Some(launched.clone());
                launched
            }
        };

        let outcome = shared.await;

        if outcome.is_ok() && !self.options.cooldown.is_zero() {
            tokio::time::sleep(self.options.cooldown).await;
        }

        outcome
    }

    /// Spawn the underlying refresh call as a detached task.
    ///
    /// Detaching means a cancelled caller never cancels a refresh other
    /// waiters depend on, and the in-flight slot is cleared on every exit
    /// path.
    fn launch(&self, delay: Duration) -> SharedRefresh {
        let core = self.core.clone();
        let endpoint = Arc::clone(&self.options.endpoint);
        let state = Arc::clone(&self.state);
        let results = self.results.clone();
        let cooldown = self.options.cooldown;

        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let outcome = match core.upgrade() {
                // The refresh request goes through the non-retrying path: a
                // trigger status from the refresh endpoint itself must not
                // recurse into another refresh.
                Some(core) => core.dispatch(endpoint.as_ref(), false).await,
                None => Err(NetworkError::InvalidCredentials),
            };

            {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.inflight = None;
                if outcome.is_ok() {
                    state.cooldown_until = Some(Instant::now() + cooldown);
                }
            }

            if let Ok(payload) = &outcome {
                // Receiver may be absent or dropped; the payload is then
                // discarded without blocking the refresh path.
                let _ = results.send(payload.clone());
            }

            outcome
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(error = %err, "refresh task aborted");
                    Err(NetworkError::InvalidCredentials)
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator").field("options", &self.options).finish()
    }
}
