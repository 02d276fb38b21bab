//! Record construction from raw protocol data.
//!
//! Each constructor produces a finished, immutable [`ProbeRecord`]; there is no
//! staged mutation and nothing is shared between probe attempts.

use reqwest::header::{HeaderMap, CONTENT_TYPE, ETAG, LAST_MODIFIED};

use super::ProbeRecord;
use crate::error_handling::OutcomeType;
use crate::ftp::FileEntry;

/// Raw shape of a final HTTP response, as seen by the HTTP prober.
#[derive(Debug)]
pub struct HttpParts<'a> {
    /// Final status code
    pub status: u16,
    /// Headers of the final response
    pub headers: &'a HeaderMap,
    /// Final URL when at least one redirect was followed
    pub redirected_to: Option<String>,
    /// Body, only for non-identity verbs
    pub body: Option<Vec<u8>>,
}

/// Splits a `Content-Type` value into mime type and charset.
///
/// `text/csv; charset=utf-8` yields `(Some("text/csv"), Some("utf-8"))`.
/// Parameters other than `charset` are ignored; surrounding quotes on the
/// charset are stripped.
pub fn split_content_type(value: &str) -> (Option<String>, Option<String>) {
    let mut parts = value.split(';').map(str::trim);

    let mime_type = parts
        .next()
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let encoding = parts.find_map(|param| {
        let (name, val) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let val = val.trim().trim_matches('"');
        (!val.is_empty()).then(|| val.to_string())
    });

    (mime_type, encoding)
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl ProbeRecord {
    /// Record for a locator that could not be reached (or was never dispatched).
    pub fn failed(url: impl Into<String>, outcome: OutcomeType) -> Self {
        ProbeRecord {
            content: None,
            status: None,
            url: url.into(),
            encoding: None,
            etag: None,
            last_modified: None,
            mime_type: None,
            url_redirect: None,
            outcome,
        }
    }

    /// Record carrying only the last status seen before giving up on retries.
    pub fn status_only(url: impl Into<String>, status: u16) -> Self {
        ProbeRecord {
            status: Some(status),
            ..ProbeRecord::failed(url, OutcomeType::RetriesExhausted)
        }
    }

    /// Record built from a final HTTP response.
    ///
    /// `url` is the locator as requested; the effective location, if different,
    /// goes to `url_redirect`. Headers are taken from the final response.
    pub fn from_http(url: impl Into<String>, parts: HttpParts<'_>) -> Self {
        let (mime_type, encoding) = header_string(parts.headers, CONTENT_TYPE)
            .map(|ct| split_content_type(&ct))
            .unwrap_or((None, None));

        let outcome = if parts.status >= 400 {
            OutcomeType::HttpErrorStatus
        } else if parts.redirected_to.is_some() {
            OutcomeType::Redirected
        } else {
            OutcomeType::Reachable
        };

        ProbeRecord {
            content: parts.body,
            status: Some(parts.status),
            url: url.into(),
            encoding,
            etag: header_string(parts.headers, ETAG),
            last_modified: header_string(parts.headers, LAST_MODIFIED),
            mime_type,
            url_redirect: parts.redirected_to,
            outcome,
        }
    }

    /// Record for a file found in an FTP directory listing.
    ///
    /// FTP has no status codes for files, so a listed file gets a synthetic 200.
    pub fn from_ftp_entry(url: impl Into<String>, entry: &FileEntry) -> Self {
        ProbeRecord {
            content: None,
            status: Some(200),
            url: url.into(),
            encoding: entry.encoding.clone(),
            etag: None,
            last_modified: entry.last_modified(),
            mime_type: entry.mime_type.clone(),
            url_redirect: entry.redirect.clone(),
            outcome: if entry.redirect.is_some() {
                OutcomeType::Redirected
            } else {
                OutcomeType::Reachable
            },
        }
    }
}
