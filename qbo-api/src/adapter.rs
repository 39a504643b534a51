//! Standard headers and parameters around the injected transport
//!
//! Every call checks for an attached transport before doing anything else,
//! so a missing credential never reaches the network.

use qbo_transport::header::{ACCEPT, ACCEPT_ENCODING, CONTENT_TYPE};
use qbo_transport::{AuthenticatedTransport, HeaderMap, HeaderValue, Part, RawResponse};
use tracing::debug;

use crate::error::{ApiError, Result};

const XML: &str = "application/xml";
const MULTIPART: &str = "multipart/form-data";

/// Multipart field name of the optional metadata document
pub const METADATA_FIELD: &str = "file_metadata_01";

pub fn get<T: AuthenticatedTransport>(
    transport: Option<&T>,
    url: &str,
    params: &[(String, String)],
    headers: HeaderMap,
) -> Result<RawResponse> {
    let transport = transport.ok_or(ApiError::Unauthenticated)?;
    let url = append_params(url, params);
    let headers = with_defaults(headers);

    debug!(method = "GET", %url, "sending request");
    Ok(transport.get(&url, &headers)?)
}

pub fn post<T: AuthenticatedTransport>(
    transport: Option<&T>,
    url: &str,
    body: &str,
    params: &[(String, String)],
    headers: HeaderMap,
) -> Result<RawResponse> {
    let transport = transport.ok_or(ApiError::Unauthenticated)?;
    let url = append_params(url, params);
    let headers = with_defaults(headers);

    debug!(method = "POST", %url, bytes = body.len(), "sending request");
    Ok(transport.post(&url, body, &headers)?)
}

/// Multipart POST; `metadata` becomes an XML part ahead of the file parts
pub fn upload<T: AuthenticatedTransport>(
    transport: Option<&T>,
    url: &str,
    fields: Vec<Part>,
    metadata: Option<&str>,
    params: &[(String, String)],
) -> Result<RawResponse> {
    let transport = transport.ok_or(ApiError::Unauthenticated)?;
    let url = append_params(url, params);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(MULTIPART));
    let headers = with_defaults(headers);

    let mut parts = Vec::with_capacity(fields.len() + 1);
    if let Some(metadata) = metadata {
        parts.push(Part::text(METADATA_FIELD, XML, metadata));
    }
    parts.extend(fields);

    debug!(method = "POST", %url, parts = parts.len(), "sending multipart request");
    Ok(transport.post_multipart(&url, &parts, &headers)?)
}

/// Merge the standard XML headers under any the caller supplied
pub fn with_defaults(mut headers: HeaderMap) -> HeaderMap {
    headers.entry(CONTENT_TYPE).or_insert(HeaderValue::from_static(XML));
    headers.entry(ACCEPT).or_insert(HeaderValue::from_static(XML));
    headers
        .entry(ACCEPT_ENCODING)
        .or_insert(HeaderValue::from_static("gzip, deflate"));
    headers
}

/// Append `key=value` pairs verbatim; values must already be encoded
pub fn append_params(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_defaults_fill_missing_headers() {
        let headers = with_defaults(HeaderMap::new());
        assert_eq!(header(&headers, "Content-Type"), Some("application/xml"));
        assert_eq!(header(&headers, "Accept"), Some("application/xml"));
        assert_eq!(header(&headers, "Accept-Encoding"), Some("gzip, deflate"));
    }

    #[test]
    fn test_defaults_respect_overrides() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("multipart/form-data"));
        let headers = with_defaults(headers);
        assert_eq!(header(&headers, "Content-Type"), Some("multipart/form-data"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_append_params() {
        assert_eq!(append_params("https://h/c/1/customer", &[]), "https://h/c/1/customer");
        assert_eq!(
            append_params("https://h/c/1/customer", &params(&[("operation", "delete"), ("minorversion", "65")])),
            "https://h/c/1/customer?operation=delete&minorversion=65"
        );
        assert_eq!(
            append_params("https://h/c/1/query?query=SELECT", &params(&[("minorversion", "65")])),
            "https://h/c/1/query?query=SELECT&minorversion=65"
        );
    }

    #[test]
    fn test_params_are_not_encoded() {
        assert_eq!(
            append_params("https://h/x", &params(&[("q", "a b&c")])),
            "https://h/x?q=a b&c"
        );
    }
}
