//! Dispatcher configuration
//!
//! Set once at construction and immutable afterwards. Endpoint-level values
//! always win over the configuration-level defaults declared here.

use std::time::Duration;

use crate::endpoint::HeaderMap;

/// Cache behavior requested for outgoing requests
///
/// Anything other than [`CachePolicy::UseProtocol`] materializes as a
/// `Cache-Control` request header; intermediaries and the transport decide
/// what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Let the HTTP protocol defaults decide
    #[default]
    UseProtocol,
    /// Revalidate with the origin before using a cached copy
    Reload,
    /// Forbid storing the response anywhere
    NoStore,
}

impl CachePolicy {
    pub(crate) fn cache_control(&self) -> Option<&'static str> {
        match self {
            Self::UseProtocol => None,
            Self::Reload => Some("no-cache"),
            Self::NoStore => Some("no-store"),
        }
    }
}

/// Immutable dispatcher configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier announced in the `Initial` lifecycle event
    pub identifier: String,
    /// Per-request timeout (default 60 s)
    pub timeout: Duration,
    /// Default cache policy for every request
    pub cache_policy: CachePolicy,
    /// Headers attached to every request; an endpoint header with the same
    /// name takes precedence
    pub extra_headers: HeaderMap,
}

impl Config {
    /// Create a configuration with default timeout, cache policy and headers.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            timeout: Duration::from_secs(60),
            cache_policy: CachePolicy::default(),
            extra_headers: HeaderMap::new(),
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    #[must_use]
    pub fn extra_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("relay-net")
    }
}
