//! Relay: async HTTP dispatch with coordinated credential refresh.
//!
//! The crate turns abstract [`Endpoint`] descriptions into concrete wire
//! requests, executes them through a pluggable [`Transport`], and handles
//! auth-expiry responses with a single-flight refresh-then-retry, while
//! broadcasting lifecycle [`Event`]s to registered observers.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use relay_net::{Config, Dispatcher, Endpoint, Method, TracingSink};
//!
//! struct ListUsers;
//!
//! impl Endpoint for ListUsers {
//!     fn host(&self) -> &str {
//!         "api.example.com"
//!     }
//!
//!     fn path(&self) -> &str {
//!         "/v1/users"
//!     }
//!
//!     fn method(&self) -> Method {
//!         Method::Get
//!     }
//! }
//!
//! # async fn example() -> relay_net::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .config(Config::new("users-service"))
//!     .event_sink(Arc::new(TracingSink::new()))
//!     .build();
//!
//! let body = dispatcher.send(&ListUsers).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Refresh
//!
//! Passing [`RefreshOptions`] to the builder enables the refresh subsystem:
//! the first response carrying the trigger status (401 by default) runs one
//! coordinated refresh call and retries the original request exactly once.
//! Concurrent requests that expire together coalesce onto a single refresh.
//! Successful refresh payloads are also delivered through
//! [`Dispatcher::take_refresh_stream`] for external consumers such as a token
//! store.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod refresh;
pub mod request;
pub mod response;
pub mod transport;

pub use config::{CachePolicy, Config};
pub use dispatch::{Dispatcher, DispatcherBuilder};
pub use endpoint::{BodyMap, Endpoint, HeaderMap, Method, QueryMap, Scheme};
pub use error::{NetworkError, Result};
pub use events::logger::TracingSink;
pub use events::{Event, EventBus, EventSink};
pub use refresh::{RefreshOptions, RefreshStream};
pub use request::multipart::{MultipartField, MultipartForm, MultipartValue};
pub use request::{RequestFormatter, WireRequest};
pub use response::{BodyExt, RequestSnapshot, ResponseSnapshot, WireResponse};
pub use transport::{ReqwestTransport, Transport, TransportFailure};
