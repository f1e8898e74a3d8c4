//! Transport abstraction and the default reqwest-backed implementation
//!
//! The dispatch core depends only on the narrow [`Transport`] contract; any
//! HTTP client that can turn a [`WireRequest`] into a [`WireResponse`] is
//! pluggable. Connection pooling, TLS and protocol negotiation all live behind
//! this seam.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::endpoint::{HeaderMap, Method};
use crate::request::WireRequest;
use crate::response::WireResponse;

/// Failure reported by a transport
///
/// `Cancelled` distinguishes caller-driven aborts from genuine delivery
/// failures so the dispatcher can classify them separately. The bundled
/// reqwest transport only produces `Failed`; custom transports may report
/// cancellation explicitly.
#[derive(Debug, Clone, Error)]
pub enum TransportFailure {
    #[error("request was cancelled")]
    Cancelled,
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Narrow capability the dispatcher sends requests through
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and hand back the raw classified response.
    ///
    /// # Errors
    /// [`TransportFailure`] when no HTTP-shaped response was produced.
    async fn perform(&self, request: WireRequest) -> Result<WireResponse, TransportFailure>;
}

/// Default transport backed by a shared [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport around a default client.
    ///
    /// # Panics
    /// Panics when the TLS backend cannot be initialized, mirroring
    /// [`reqwest::Client::new`]. Use [`ReqwestTransport::try_new`] or
    /// [`ReqwestTransport::with_client`] to handle that failure instead.
    #[must_use]
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    /// Fallible variant of [`ReqwestTransport::new`].
    ///
    /// # Errors
    /// [`TransportFailure::Failed`] when the underlying client cannot be
    /// constructed.
    pub fn try_new() -> Result<Self, TransportFailure> {
        let client =
            Client::builder().build().map_err(|err| TransportFailure::Failed(err.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client (custom pools, proxies, TLS).
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn perform(&self, request: WireRequest) -> Result<WireResponse, TransportFailure> {
        let method = into_reqwest_method(request.method);
        let mut builder =
            self.client.request(method, request.url.clone()).timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportFailure::Failed(err.to_string()))?;

        let status = response.status().as_u16();
        debug!(url = %request.url, status, "received response");

        let headers = collect_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportFailure::Failed(err.to_string()))?
            .to_vec();

        Ok(WireResponse { status, headers, body })
    }
}

fn into_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut collected = HeaderMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            collected.insert(name.as_str().to_owned(), value.to_owned());
        }
    }
    collected
}
