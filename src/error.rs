//! Error taxonomy.
//!
//! Failures are typed exceptions, never sentinel return values. Every
//! transport-level variant carries the originating [`Request`] for
//! diagnostics; HTTP-level rejection carries the whole [`Response`] so
//! callers can inspect the status, body and headers of the failure.

use thiserror::Error;

use crate::types::{Request, Response};

/// Boxed error cause for network-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can go wrong while preparing or sending a request.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Base and path cannot be parsed into an absolute URL.
    #[error("the request [{}] has an invalid URL", .request.line())]
    InvalidRequestUrl { request: Box<Request> },

    /// The transport was explicitly aborted mid-flight.
    #[error("the request [{}] has been aborted", .request.line())]
    RequestAborted { request: Box<Request> },

    /// Network-level failure, carrying the underlying cause.
    #[error("the request [{}] has failed: {}", .request.line(), .source)]
    RequestFailed {
        request: Box<Request>,
        #[source]
        source: BoxError,
    },

    /// The configured timeout elapsed before the response arrived.
    #[error("the request [{}] exceeded the [{}ms] timeout", .request.line(), .request.timeout)]
    RequestTimedOut { request: Box<Request> },

    /// A single-use transport handle was reused for a second send.
    #[error("the request [{}] has been invalidated", .request.line())]
    RequestInvalidated { request: Box<Request> },

    /// The pipeline completed without any executor assigned.
    #[error("the request [{}] has no executor assigned", .request.line())]
    NoExecutorProvided { request: Box<Request> },

    /// The executor completed but the status was 400 or above. This rejects
    /// with the response itself rather than a transport failure.
    #[error("the request failed with status [{}]", .0.status)]
    Status(Box<Response>),

    /// The response body could not be deserialized into the requested type.
    #[error("failed to decode the response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CourierError {
    /// The HTTP status of an HTTP-level rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            CourierError::Status(response) => Some(response.status),
            _ => None,
        }
    }

    /// The rejected response of an HTTP-level rejection, if this is one.
    pub fn response(&self) -> Option<&Response> {
        match self {
            CourierError::Status(response) => Some(response),
            _ => None,
        }
    }

    /// The originating request, for transport-level failures.
    pub fn request(&self) -> Option<&Request> {
        match self {
            CourierError::InvalidRequestUrl { request }
            | CourierError::RequestAborted { request }
            | CourierError::RequestFailed { request, .. }
            | CourierError::RequestTimedOut { request }
            | CourierError::RequestInvalidated { request }
            | CourierError::NoExecutorProvided { request } => Some(request),
            CourierError::Status(_) | CourierError::Decode(_) => None,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CourierError>;
