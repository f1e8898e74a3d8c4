//! Abstract endpoint descriptions
//!
//! An [`Endpoint`] describes a single remote operation: where it lives, which
//! method it uses, and what it carries. The dispatch core treats endpoints as
//! read-only; the calling application owns them and supplies as many as it
//! needs.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::request::multipart::MultipartForm;

/// Query parameters keyed by name
pub type QueryMap = BTreeMap<String, String>;

/// Header map keyed by header name
pub type HeaderMap = BTreeMap<String, String>;

/// Structured request body (key-unique JSON object)
pub type BodyMap = Map<String, Value>;

/// URL scheme for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// HTTP method for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Contract implemented by endpoint descriptors
///
/// Only `host`, `path` and `method` are mandatory; everything else carries a
/// sensible default (HTTPS, no port, no query, no headers, no body).
///
/// # Examples
/// ```
/// use relay_net::{Endpoint, Method};
///
/// struct ListUsers;
///
/// impl Endpoint for ListUsers {
///     fn host(&self) -> &str {
///         "api.example.com"
///     }
///
///     fn path(&self) -> &str {
///         "/v1/users"
///     }
///
///     fn method(&self) -> Method {
///         Method::Get
///     }
/// }
/// ```
pub trait Endpoint: Send + Sync {
    /// URL scheme (defaults to HTTPS)
    fn scheme(&self) -> Scheme {
        Scheme::Https
    }

    /// Host name, without scheme or port
    fn host(&self) -> &str;

    /// Request path, starting with `/`
    fn path(&self) -> &str;

    /// Explicit port, if the endpoint needs one
    fn port(&self) -> Option<u16> {
        None
    }

    /// HTTP method
    fn method(&self) -> Method;

    /// Query parameters; values are percent-encoded at build time
    fn query(&self) -> Option<QueryMap> {
        None
    }

    /// Endpoint-specific headers; these win over configuration-level extras
    fn headers(&self) -> Option<HeaderMap> {
        None
    }

    /// Structured JSON body
    fn body(&self) -> Option<BodyMap> {
        None
    }

    /// Multipart payload; when present it takes precedence over `body`
    fn multipart(&self) -> Option<MultipartForm> {
        None
    }
}

/// Human-readable endpoint label used in errors and events
pub(crate) fn label(endpoint: &dyn Endpoint) -> String {
    format!("{}{}", endpoint.host(), endpoint.path())
}
