//! Error types for the transport layer

use thiserror::Error;

/// Errors raised by an [`AuthenticatedTransport`](crate::AuthenticatedTransport)
/// before a complete HTTP response could be obtained.
///
/// An HTTP response with a non-success status is not an error at this layer;
/// it is returned as a [`RawResponse`](crate::RawResponse) for the caller to classify.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or protocol failure
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The response body could not be read
    #[error("I/O error reading response: {0}")]
    Io(String),

    /// The HTTP client could not be set up
    #[error("HTTP client setup failed: {0}")]
    Setup(String),

    /// The request could not be assembled from its parts
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
