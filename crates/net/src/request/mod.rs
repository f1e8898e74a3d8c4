//! Wire request construction
//!
//! [`RequestFormatter`] is a pure translation step: it resolves an
//! [`Endpoint`] plus the dispatcher [`Config`] into a fully concrete
//! [`WireRequest`]. It performs no I/O and keeps no state, so it is safe to
//! call concurrently; two builds of the same inputs differ only in the
//! multipart boundary.

pub mod mime;
pub mod multipart;

use std::time::Duration;

use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::endpoint::{self, Endpoint, HeaderMap, Method};
use crate::error::{NetworkError, Result};

/// Header naming the cache policy, see [`crate::config::CachePolicy`]
const CACHE_CONTROL: &str = "Cache-Control";

/// Header naming the multipart boundary
const CONTENT_TYPE: &str = "Content-Type";

/// Fully resolved request, ready for the transport
///
/// Built fresh per send attempt; a retry never reuses the previous instance
/// because headers or credentials may have changed in between.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

/// Pure endpoint-to-request translation
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFormatter;

impl RequestFormatter {
    /// Build a [`WireRequest`] from an endpoint and the dispatcher config.
    ///
    /// # Errors
    /// - [`NetworkError::InvalidUrl`] when the composed URL does not parse
    /// - [`NetworkError::Encode`] when the structured body fails to serialize
    pub fn build(&self, endpoint: &dyn Endpoint, config: &Config) -> Result<WireRequest> {
        let url = self.build_url(endpoint)?;
        let mut headers = self.build_headers(endpoint, config);

        let body = if let Some(form) = endpoint.multipart() {
            let boundary = Uuid::new_v4().to_string();
            // Set after the merge so the boundary header always wins.
            headers.insert(CONTENT_TYPE.into(), multipart::content_type(&boundary));
            Some(multipart::encode(&form, &boundary))
        } else if let Some(map) = endpoint.body() {
            Some(serde_json::to_vec(&serde_json::Value::Object(map)).map_err(NetworkError::encode)?)
        } else {
            None
        };

        Ok(WireRequest {
            url,
            method: endpoint.method(),
            headers,
            body,
            timeout: config.timeout,
        })
    }

    fn build_url(&self, endpoint: &dyn Endpoint) -> Result<Url> {
        let mut raw = format!("{}://{}", endpoint.scheme().as_str(), endpoint.host());
        if let Some(port) = endpoint.port() {
            raw.push_str(&format!(":{port}"));
        }
        raw.push_str(endpoint.path());

        let mut url =
            Url::parse(&raw).map_err(|_| NetworkError::InvalidUrl(endpoint::label(endpoint)))?;

        if let Some(query) = endpoint.query() {
            let encoded = query
                .iter()
                .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&encoded));
        }

        Ok(url)
    }

    fn build_headers(&self, endpoint: &dyn Endpoint, config: &Config) -> HeaderMap {
        // Endpoint headers take precedence over config-level extras.
        let mut headers = endpoint.headers().unwrap_or_default();
        for (name, value) in &config.extra_headers {
            headers.entry(name.clone()).or_insert_with(|| value.clone());
        }

        if let Some(directive) = config.cache_policy.cache_control() {
            headers.entry(CACHE_CONTROL.into()).or_insert_with(|| directive.into());
        }

        headers
    }
}
