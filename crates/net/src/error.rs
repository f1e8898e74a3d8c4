//! Error types for the dispatch pipeline
//!
//! Every failure surfaces to the caller as a typed [`NetworkError`]; nothing is
//! swallowed. The only internally handled case is the first occurrence of the
//! refresh-trigger status code, which becomes a refresh-then-retry action
//! instead of an error.

use std::sync::Arc;

use thiserror::Error;

use crate::response::ResponseSnapshot;

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Main error type for the dispatch layer
///
/// Variants that carry an endpoint hold its `host + path` label. Causes are
/// `Arc`-wrapped so errors stay cheap to clone into the event stream.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    /// Request body could not be serialized
    #[error("request encoding failed: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    /// Response body could not be decoded
    #[error("response decoding failed")]
    Decode(#[source] Option<Arc<serde_json::Error>>),

    /// The endpoint description does not compose into a parsable URL
    #[error("invalid url for endpoint {0}")]
    InvalidUrl(String),

    /// The transport produced no classifiable response
    #[error("request to {0} failed")]
    Transport(String),

    /// The request was cancelled before a response arrived
    #[error("request to {0} was cancelled")]
    Cancelled(String),

    /// The server answered with a status outside the success range
    #[error("unexpected status code {}", .0.status)]
    UnexpectedStatus(Box<ResponseSnapshot>),

    /// Credential refresh failed, or the trigger status recurred after a retry
    #[error("credential refresh failed")]
    InvalidCredentials,
}

impl NetworkError {
    pub(crate) fn encode(err: serde_json::Error) -> Self {
        Self::Encode(Arc::new(err))
    }

    pub(crate) fn decode(err: serde_json::Error) -> Self {
        Self::Decode(Some(Arc::new(err)))
    }

    /// Status snapshot for [`NetworkError::UnexpectedStatus`] failures
    pub fn response(&self) -> Option<&ResponseSnapshot> {
        match self {
            Self::UnexpectedStatus(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

// Equality by rendered description keeps test assertions simple without
// requiring every wrapped cause to be comparable.
impl PartialEq for NetworkError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
