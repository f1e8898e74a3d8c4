//! Request dispatch pipeline
//!
//! [`Dispatcher`] orchestrates the whole flow: build the wire request, send it
//! through the transport, classify the response, trigger a coordinated
//! refresh-then-retry on an auth-expiry status, and emit lifecycle events
//! throughout. A given original request is retried at most once, no matter how
//! often the trigger status recurs.

use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::config::Config;
use crate::endpoint::{self, Endpoint};
use crate::error::{NetworkError, Result};
use crate::events::{Event, EventBus, EventSink};
use crate::refresh::{RefreshCoordinator, RefreshOptions, RefreshStream};
use crate::request::RequestFormatter;
use crate::response::{RequestSnapshot, ResponseSnapshot, SUCCESS_CODES};
use crate::transport::{ReqwestTransport, Transport, TransportFailure};

/// Entry point of the dispatch layer
///
/// Cheap to share behind an `Arc`; all state is interior and the send path is
/// safe to drive from arbitrarily many tasks concurrently.
///
/// # Examples
/// ```no_run
/// # use relay_net::{Config, Dispatcher, Endpoint, Method};
/// # struct ListUsers;
/// # impl Endpoint for ListUsers {
/// #     fn host(&self) -> &str { "api.example.com" }
/// #     fn path(&self) -> &str { "/v1/users" }
/// #     fn method(&self) -> Method { Method::Get }
/// # }
/// # async fn example() -> relay_net::Result<()> {
/// let dispatcher = Dispatcher::builder().config(Config::new("users-service")).build();
/// let body = dispatcher.send(&ListUsers).await?;
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    core: Arc<DispatcherCore>,
    refresh_stream: Mutex<Option<RefreshStream>>,
}

impl Dispatcher {
    /// Start building a dispatcher.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Convenience constructor: default transport, no sinks, no refresh.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::builder().config(config).build()
    }

    /// Send a request described by `endpoint` and return the response body.
    ///
    /// On the first occurrence of the refresh-trigger status the dispatcher
    /// refreshes credentials and retries exactly once with a freshly built
    /// request.
    ///
    /// # Errors
    /// A single terminal [`NetworkError`] per call; see the crate-level
    /// taxonomy.
    pub async fn send(&self, endpoint: &dyn Endpoint) -> Result<Vec<u8>> {
        self.core.dispatch(endpoint, true).await
    }

    /// Take the refresh-result stream, if refresh is configured.
    ///
    /// Yields every successful refresh payload exactly once, in order,
    /// independent of which request triggered it. Can be taken only once.
    #[must_use]
    pub fn take_refresh_stream(&self) -> Option<RefreshStream> {
        self.refresh_stream.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// The immutable configuration this dispatcher was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.core.config
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("identifier", &self.core.config.identifier).finish()
    }
}

/// Builder for [`Dispatcher`]
#[derive(Default)]
pub struct DispatcherBuilder {
    config: Option<Config>,
    transport: Option<Arc<dyn Transport>>,
    sinks: Vec<Arc<dyn EventSink>>,
    refresh: Option<RefreshOptions>,
}

impl DispatcherBuilder {
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default reqwest transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register a lifecycle event sink; order of registration is delivery
    /// order.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Enable the refresh subsystem.
    #[must_use]
    pub fn refresh(mut self, options: RefreshOptions) -> Self {
        self.refresh = Some(options);
        self
    }

    #[must_use]
    pub fn build(self) -> Dispatcher {
        let config = self.config.unwrap_or_default();
        let transport =
            self.transport.unwrap_or_else(|| Arc::new(ReqwestTransport::new()) as Arc<dyn Transport>);

        let core = Arc::new(DispatcherCore {
            config,
            formatter: RequestFormatter,
            transport,
            events: EventBus::new(self.sinks),
            refresher: OnceCell::new(),
        });

        let mut refresh_stream = None;
        if let Some(options) = self.refresh {
            let (coordinator, stream) = RefreshCoordinator::new(Arc::downgrade(&core), options);
            // The cell is freshly created above, so this cannot already be set.
            let _ = core.refresher.set(coordinator);
            refresh_stream = Some(stream);
        }

        core.events.notify(&Event::Initial(core.config.identifier.clone()));

        Dispatcher { core, refresh_stream: Mutex::new(refresh_stream) }
    }
}

/// Shared pipeline state reachable from the coordinator via a weak handle
pub(crate) struct DispatcherCore {
    pub(crate) config: Config,
    formatter: RequestFormatter,
    transport: Arc<dyn Transport>,
    events: EventBus,
    refresher: OnceCell<RefreshCoordinator>,
}

impl DispatcherCore {
    /// Run the pipeline for one original request.
    ///
    /// `allow_retry` starts true for caller requests and false for the
    /// refresh endpoint's own request, which must never recurse into another
    /// refresh.
    pub(crate) async fn dispatch(
        &self,
        endpoint: &dyn Endpoint,
        mut allow_retry: bool,
    ) -> Result<Vec<u8>> {
        let target = endpoint::label(endpoint);

        loop {
            // Built fresh per attempt so externally updated credential state
            // is picked up on retry. A build failure propagates with no
            // events.
            let request = self.formatter.build(endpoint, &self.config)?;
            let request_snapshot = RequestSnapshot::new(&target, request.clone());
            self.events.notify(&Event::RequestSent(request_snapshot.clone()));
            debug!(endpoint = %target, method = request.method.as_str(), "sending request");

            let response = match self.transport.perform(request).await {
                Ok(response) => response,
                Err(failure) => {
                    // Pure transport failures are terminal, never retried.
                    let error = match failure {
                        TransportFailure::Cancelled => NetworkError::Cancelled(target.clone()),
                        TransportFailure::Failed(_) => NetworkError::Transport(target.clone()),
                    };
                    self.events.notify(&Event::Error(error.clone()));
                    return Err(error);
                }
            };

            let snapshot = ResponseSnapshot::new(request_snapshot, response);
            self.events.notify(&Event::ResponseReceived(snapshot.clone()));

            if let Some(refresher) = self.refresher.get() {
                if snapshot.status == refresher.trigger_status() {
                    if !allow_retry {
                        return self.fail(NetworkError::InvalidCredentials);
                    }
                    debug!(endpoint = %target, "trigger status received, refreshing credentials");
                    if refresher.refresh().await.is_err() {
                        return self.fail(NetworkError::InvalidCredentials);
                    }
                    allow_retry = false;
                    continue;
                }
            }

            if SUCCESS_CODES.contains(&snapshot.status) {
                return Ok(snapshot.body);
            }

            return self.fail(NetworkError::UnexpectedStatus(Box::new(snapshot)));
        }
    }

    fn fail(&self, error: NetworkError) -> Result<Vec<u8>> {
        self.events.notify(&Event::Error(error.clone()));
        Err(error)
    }
}
