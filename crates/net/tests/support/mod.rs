//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::BoxFuture;
use relay_net::{
    BodyMap, Endpoint, Event, EventSink, HeaderMap, Method, MultipartForm, Scheme, Transport,
    TransportFailure, WireRequest, WireResponse,
};

/// Endpoint fixture pointing at an arbitrary base URI (usually a wiremock
/// server).
pub struct TestEndpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub method: Method,
    pub headers: Option<HeaderMap>,
    pub body: Option<BodyMap>,
    pub multipart: Option<MultipartForm>,
}

impl TestEndpoint {
    pub fn new(uri: &str, path: &str, method: Method) -> Self {
        let url = url::Url::parse(uri).expect("test uri");
        let scheme = if url.scheme() == "http" { Scheme::Http } else { Scheme::Https };
        Self {
            scheme,
            host: url.host_str().expect("test host").to_owned(),
            port: url.port(),
            path: path.to_owned(),
            method,
            headers: None,
            body: None,
            multipart: None,
        }
    }

    pub fn get(uri: &str, path: &str) -> Self {
        Self::new(uri, path, Method::Get)
    }

    pub fn post(uri: &str, path: &str) -> Self {
        Self::new(uri, path, Method::Post)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.get_or_insert_with(HeaderMap::new).insert(name.into(), value.into());
        self
    }
}

impl Endpoint for TestEndpoint {
    fn scheme(&self) -> Scheme {
        self.scheme
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn port(&self) -> Option<u16> {
        self.port
    }

    fn method(&self) -> Method {
        self.method
    }

    fn headers(&self) -> Option<HeaderMap> {
        self.headers.clone()
    }

    fn body(&self) -> Option<BodyMap> {
        self.body.clone()
    }

    fn multipart(&self) -> Option<MultipartForm> {
        self.multipart.clone()
    }
}

/// Sink that records a short label per delivered event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn handle(&self, event: &Event) {
        let label = match event {
            Event::Initial(_) => "initial".to_owned(),
            Event::RequestSent(_) => "request".to_owned(),
            Event::ResponseReceived(snapshot) => format!("response:{}", snapshot.status),
            Event::Error(_) => "error".to_owned(),
            Event::Custom(_) => "custom".to_owned(),
        };
        self.events.lock().unwrap().push(label);
    }
}

type Handler = Box<
    dyn Fn(WireRequest) -> BoxFuture<'static, Result<WireResponse, TransportFailure>>
        + Send
        + Sync,
>;

/// Transport backed by a closure, for deterministic concurrency tests.
pub struct FnTransport {
    handler: Handler,
}

impl FnTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(WireRequest) -> BoxFuture<'static, Result<WireResponse, TransportFailure>>
            + Send
            + Sync
            + 'static,
    {
        Self { handler: Box::new(handler) }
    }
}

#[async_trait]
impl Transport for FnTransport {
    async fn perform(&self, request: WireRequest) -> Result<WireResponse, TransportFailure> {
        (self.handler)(request).await
    }
}

/// Minimal successful response with the given status and body.
pub fn response(status: u16, body: &[u8]) -> WireResponse {
    WireResponse { status, headers: HeaderMap::new(), body: body.to_vec() }
}
