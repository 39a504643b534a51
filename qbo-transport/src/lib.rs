//! Authenticated HTTPS transport for the accounting API client
//!
//! This crate defines the transport capability the API layer is built on and
//! ships one blocking implementation that attaches an OAuth2 bearer token to
//! every request. Obtaining and refreshing that token is the caller's job.

mod error;
mod multipart;

pub use error::TransportError;
pub use multipart::Part;
pub use reqwest::header::{self, HeaderMap, HeaderValue};

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT_ENCODING, CONTENT_TYPE};
use reqwest::redirect::Policy;

/// Status code and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A transport that can perform signed/authorized requests.
///
/// Implementations must return every received HTTP response as a
/// [`RawResponse`], whatever its status; only failures to obtain a response
/// at all are reported as [`TransportError`]. Retries and timeouts, if any,
/// belong to the implementation.
pub trait AuthenticatedTransport {
    fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError>;

    fn post(&self, url: &str, body: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError>;

    fn post_multipart(
        &self,
        url: &str,
        parts: &[Part],
        headers: &HeaderMap,
    ) -> Result<RawResponse, TransportError>;
}

impl<T: AuthenticatedTransport + ?Sized> AuthenticatedTransport for Box<T> {
    fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError> {
        (**self).get(url, headers)
    }

    fn post(&self, url: &str, body: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError> {
        (**self).post(url, body, headers)
    }

    fn post_multipart(
        &self,
        url: &str,
        parts: &[Part],
        headers: &HeaderMap,
    ) -> Result<RawResponse, TransportError> {
        (**self).post_multipart(url, parts, headers)
    }
}

/// Blocking transport that authorizes requests with an OAuth2 bearer token
///
/// Response compression is negotiated by the client itself: it advertises
/// and decodes gzip and deflate, so any `Accept-Encoding` the caller passes
/// is dropped rather than forwarded.
#[derive(Clone)]
pub struct BearerTransport {
    client: Client,
    access_token: String,
}

impl BearerTransport {
    /// Create a transport with default timeouts
    pub fn new(access_token: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .redirect(Policy::none())
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self::with_client(client, access_token))
    }

    /// Create a transport around a preconfigured client
    ///
    /// The client should not follow redirects; the API never issues them and
    /// callers rely on seeing the 3xx status.
    pub fn with_client(client: Client, access_token: impl Into<String>) -> Self {
        Self {
            client,
            access_token: access_token.into(),
        }
    }

    /// Replace the bearer token, e.g. after an out-of-band refresh
    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = access_token.into();
    }

    fn prepare(&self, request: RequestBuilder, headers: &HeaderMap) -> RequestBuilder {
        let mut headers = headers.clone();
        headers.remove(ACCEPT_ENCODING);
        request.bearer_auth(&self.access_token).headers(headers)
    }

    fn finish(result: reqwest::Result<Response>) -> Result<RawResponse, TransportError> {
        // Every status, errors included, carries the XML body the caller needs
        let response = result.map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::Io(e.to_string()))?;

        tracing::trace!(status, bytes = body.len(), "received response");
        Ok(RawResponse { status, body })
    }
}

impl fmt::Debug for BearerTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTransport")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl AuthenticatedTransport for BearerTransport {
    fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError> {
        Self::finish(self.prepare(self.client.get(url), headers).send())
    }

    fn post(&self, url: &str, body: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError> {
        let request = self.prepare(self.client.post(url), headers);
        Self::finish(request.body(body.to_string()).send())
    }

    fn post_multipart(
        &self,
        url: &str,
        parts: &[Part],
        headers: &HeaderMap,
    ) -> Result<RawResponse, TransportError> {
        let form = multipart::form(parts)?;

        // The form supplies its own content type with the boundary
        let mut headers = headers.clone();
        headers.remove(CONTENT_TYPE);

        let request = self.prepare(self.client.post(url), &headers);
        Self::finish(request.multipart(form).send())
    }
}
