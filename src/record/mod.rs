//! Normalized probe results.
//!
//! A [`ProbeRecord`] is the protocol-agnostic outcome of probing one locator.
//! Records are immutable once built; they are only created through the
//! constructors in [`builder`], which normalize raw HTTP or FTP data.

mod builder;

use serde::{Serialize, Serializer};

use crate::error_handling::OutcomeType;

pub use builder::{split_content_type, HttpParts};

/// Column order used by tabular sinks.
pub const RECORD_COLUMNS: [&str; 8] = [
    "content",
    "status",
    "url",
    "encoding",
    "etag",
    "last_modified",
    "mime_type",
    "url_redirect",
];

/// Outcome of probing one locator.
///
/// `status == None` with no content means the locator could not be reached at
/// all (invalid, unsupported, or transient failures until the retry ceiling).
/// When `url_redirect` is set, `url` still holds the locator as requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeRecord {
    #[serde(serialize_with = "serialize_content")]
    content: Option<Vec<u8>>,
    status: Option<u16>,
    url: String,
    encoding: Option<String>,
    etag: Option<String>,
    last_modified: Option<String>,
    mime_type: Option<String>,
    url_redirect: Option<String>,
    #[serde(skip)]
    outcome: OutcomeType,
}

impl ProbeRecord {
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn url_redirect(&self) -> Option<&str> {
        self.url_redirect.as_deref()
    }

    /// Statistics category of this record (not serialized).
    pub fn outcome(&self) -> OutcomeType {
        self.outcome
    }

    /// Whether the locator could not be reached at all.
    pub fn is_total_failure(&self) -> bool {
        self.status.is_none() && self.content.is_none()
    }
}

impl std::fmt::Display for ProbeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let reason = self
            .status
            .and_then(|s| reqwest::StatusCode::from_u16(s).ok())
            .and_then(|s| s.canonical_reason())
            .unwrap_or("");
        write!(
            f,
            "<ProbeRecord {} {} url={:?} length={} encoding={:?} mimetype={:?}>",
            status,
            reason,
            self.url,
            self.content.as_ref().map(Vec::len).unwrap_or(0),
            self.encoding,
            self.mime_type
        )
    }
}

// Bodies are written as lossy UTF-8 so tabular sinks can hold them.
fn serialize_content<S: Serializer>(content: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match content {
        Some(bytes) => s.serialize_some(&String::from_utf8_lossy(bytes)),
        None => s.serialize_none(),
    }
}
