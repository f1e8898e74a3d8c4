//! Responses, lifecycle snapshots and body decoding helpers

use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::endpoint::HeaderMap;
use crate::error::{NetworkError, Result};
use crate::request::WireRequest;

/// Status codes treated as success by the dispatch pipeline
pub(crate) const SUCCESS_CODES: RangeInclusive<u16> = 200..=299;

/// Raw response handed back by the transport
///
/// Ephemeral: the dispatcher classifies it immediately and either returns the
/// body or folds the response into a snapshot.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Immutable record of a request as it went out on the wire
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    /// `host + path` label of the originating endpoint
    pub endpoint: String,
    pub request: WireRequest,
}

impl RequestSnapshot {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, request: WireRequest) -> Self {
        Self { endpoint: endpoint.into(), request }
    }

    /// Render the request as a cURL command for diagnostics.
    #[must_use]
    pub fn curl(&self) -> String {
        let mut parts =
            vec![format!("curl -X {} '{}'", self.request.method.as_str(), self.request.url)];
        for (name, value) in &self.request.headers {
            parts.push(format!("-H '{name}: {value}'"));
        }
        if let Some(body) = &self.request.body {
            parts.push(format!("--data '{}'", String::from_utf8_lossy(body)));
        }
        parts.join(" \\\n\t")
    }
}

/// Immutable record of a classified response, paired with its request
///
/// Carried by `ResponseReceived` events and by
/// [`NetworkError::UnexpectedStatus`] for diagnostics.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub request: RequestSnapshot,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    #[must_use]
    pub fn new(request: RequestSnapshot, response: WireResponse) -> Self {
        Self { request, status: response.status, headers: response.headers, body: response.body }
    }
}

/// JSON decoding helpers for response bodies
pub trait BodyExt {
    /// Decode the whole body into `T`.
    ///
    /// # Errors
    /// [`NetworkError::Decode`] when the body is not valid JSON for `T`.
    fn decode<T: DeserializeOwned>(&self) -> Result<T>;

    /// Decode the object stored under a top-level `key`.
    ///
    /// # Errors
    /// [`NetworkError::Decode`] when the body does not parse or the key is
    /// absent.
    fn decode_at<T: DeserializeOwned>(&self, key: &str) -> Result<T>;

    /// Extract a string value stored under a top-level `key`.
    ///
    /// # Errors
    /// [`NetworkError::Decode`] when the key is absent or not a string.
    fn decode_string(&self, key: &str) -> Result<String>;

    /// Pretty-printed JSON rendering, falling back to lossy UTF-8.
    fn pretty_json(&self) -> String;
}

impl BodyExt for [u8] {
    fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(self).map_err(NetworkError::decode)
    }

    fn decode_at<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value: Value = serde_json::from_slice(self).map_err(NetworkError::decode)?;
        let nested = value.get(key).cloned().ok_or(NetworkError::Decode(None))?;
        serde_json::from_value(nested).map_err(NetworkError::decode)
    }

    fn decode_string(&self, key: &str) -> Result<String> {
        let value: Value = serde_json::from_slice(self).map_err(NetworkError::decode)?;
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(NetworkError::Decode(None))
    }

    fn pretty_json(&self) -> String {
        match serde_json::from_slice::<Value>(self) {
            Ok(value) => serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| String::from_utf8_lossy(self).into_owned()),
            Err(_) => String::from_utf8_lossy(self).into_owned(),
        }
    }
}
