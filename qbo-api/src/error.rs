use qbo_transport::TransportError;
use thiserror::Error;

use crate::entity::EntityError;

/// High-level API errors for accounting service calls
///
/// Every failure surfaces to the immediate caller; nothing here is retried
/// internally. Variants carry enough detail (status, body, normalized fault
/// fields or parsing cause) to be logged without re-reading the transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service is not configured well enough to build a URL
    ///
    /// Raised before any network I/O, typically because no company id was set.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No authenticated transport is attached to the service
    #[error("Unauthenticated: no access token or transport configured")]
    Unauthenticated,

    /// HTTP 401: the credential was rejected
    #[error("Authorization failure (HTTP 401)")]
    AuthorizationFailure(String),

    /// HTTP 403: the credential lacks permission for this resource
    #[error("Forbidden (HTTP 403)")]
    Forbidden(String),

    /// HTTP 503/504: transient, a caller-level retry policy may try again
    #[error("Service unavailable (HTTP {status})")]
    ServiceUnavailable { status: u16, body: String },

    /// HTTP 302: the API never redirects, so this is a protocol violation
    #[error("Unsupported redirect (HTTP 302)")]
    UnsupportedRedirect(String),

    /// Any status the protocol does not define
    #[error("Unexpected HTTP status {status}")]
    UnexpectedHttpStatus { status: u16, body: String },

    /// Structured fault reported by the service
    #[error(transparent)]
    Request(Box<IntuitRequestError>),

    /// A success response whose body could not be projected into entities
    #[error("Response parsing error: {message}")]
    ResponseParsing {
        message: String,
        #[source]
        source: Option<EntityError>,
    },

    /// Invalid argument supplied by the caller, e.g. a zero page number
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Entity cannot be used for the requested operation, e.g. update without an id
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// The injected transport failed before producing a response
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    pub(crate) fn parsing(message: impl Into<String>) -> Self {
        Self::ResponseParsing {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status associated with this failure, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthorizationFailure(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::UnsupportedRedirect(_) => Some(302),
            ApiError::ServiceUnavailable { status, .. }
            | ApiError::UnexpectedHttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller-level retry might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::ServiceUnavailable { .. })
    }

    /// The structured service fault, if this is one
    pub fn as_request_error(&self) -> Option<&IntuitRequestError> {
        match self {
            ApiError::Request(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IntuitRequestError> for ApiError {
    fn from(error: IntuitRequestError) -> Self {
        ApiError::Request(Box::new(error))
    }
}

/// Structured fault returned by the accounting service
///
/// Built from the `<Fault>` fragment of a response body. `request_body` is the
/// payload that was sent, kept verbatim for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Intuit request error {code} ({error_type}): {message}")]
pub struct IntuitRequestError {
    pub message: String,
    pub detail: String,
    pub code: String,
    pub error_type: String,
    pub element: String,
    pub request_body: Option<String>,
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
