//! Mapping of a raw response onto success or a typed failure
//!
//! This is the only place HTTP status codes are interpreted. A 200 is not
//! enough for success: the body may still carry a fault fragment.

use qbo_transport::RawResponse;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::fault::extract_error;
use crate::xml::{response_is_error, Document};

/// Classify one response; `Ok(())` means the document may be projected
pub fn check_response(
    response: &RawResponse,
    document: &Document,
    request_body: Option<&str>,
) -> Result<()> {
    debug!(status = response.status, "classifying response");

    match response.status {
        200 => {
            if response_is_error(document) {
                Err(service_error(response, document, request_body))
            } else {
                Ok(())
            }
        }
        400 | 500 => Err(service_error(response, document, request_body)),
        401 => Err(ApiError::AuthorizationFailure(response.body.clone())),
        403 => Err(ApiError::Forbidden(response.body.clone())),
        503 | 504 => Err(ApiError::ServiceUnavailable {
            status: response.status,
            body: response.body.clone(),
        }),
        302 => Err(ApiError::UnsupportedRedirect(response.body.clone())),
        status => Err(ApiError::UnexpectedHttpStatus {
            status,
            body: response.body.clone(),
        }),
    }
}

fn service_error(response: &RawResponse, document: &Document, request_body: Option<&str>) -> ApiError {
    let record = extract_error(document, &response.body);
    debug!(
        code = %record.code,
        error_type = %record.error_type,
        message = %record.message,
        "service reported a fault"
    );
    record.into_request_error(request_body).into()
}
