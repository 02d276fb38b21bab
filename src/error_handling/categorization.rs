//! Error categorization.
//!
//! Maps transport-level errors onto [`ProbeError`] variants.

use super::types::ProbeError;

/// Categorizes a `reqwest::Error` into a `ProbeError`.
///
/// Timeouts become [`ProbeError::Timeout`], connection and request failures
/// become [`ProbeError::Network`], everything else (redirect, builder, decode
/// errors) is reported as a protocol error.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> ProbeError {
    if error.is_timeout() {
        ProbeError::Timeout(error.to_string())
    } else if error.is_connect() || error.is_request() || error.is_body() {
        ProbeError::Network(error.to_string())
    } else {
        ProbeError::Protocol {
            code: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}
