//! Error type definitions.
//!
//! This module defines the error enums used by the probers and the orchestrator,
//! and the outcome types tracked in run statistics.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Errors raised while talking to a remote host.
///
/// Each variant states whether it is worth retrying via [`ProbeError::is_transient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Connection could not be established or was reset.
    #[error("network error: {0}")]
    Network(String),

    /// The operation did not complete within the request timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The remote answered with something we cannot use
    /// (unexpected FTP reply, broken redirect, missing status).
    #[error("protocol error{}: {message}", code_suffix(.code))]
    Protocol {
        /// Reply code when the protocol carries one
        code: Option<u16>,
        /// Server message or description
        message: String,
    },
}

fn code_suffix(code: &Option<u16>) -> String {
    code.map(|c| format!(" ({c})")).unwrap_or_default()
}

impl ProbeError {
    /// Creates a protocol error without a reply code.
    pub fn protocol(message: impl Into<String>) -> Self {
        ProbeError::Protocol {
            code: None,
            message: message.into(),
        }
    }

    /// Whether a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProbeError::Network(_) | ProbeError::Timeout(_))
    }

    /// Whether this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout(_))
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                ProbeError::Timeout(err.to_string())
            }
            std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
                ProbeError::protocol(err.to_string())
            }
            _ => ProbeError::Network(err.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for ProbeError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ProbeError::Timeout(err.to_string())
    }
}

/// Errors that stop a whole run.
#[derive(Error, Debug)]
pub enum RunError {
    /// An FTP host refused the connection with a non-timeout error and the
    /// configuration asks for the run to stop.
    #[error("fatal FTP error on {parent}: {source}")]
    FatalFtp {
        /// Parent key of the group being probed
        parent: String,
        /// Underlying connection error
        #[source]
        source: ProbeError,
    },
}

/// Outcome categories tracked per record.
///
/// Every record produced by a run carries exactly one outcome, so the counters
/// sum to the number of input locators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum OutcomeType {
    /// Resource answered with a 1xx/2xx/3xx status (FTP: file listed)
    Reachable,
    /// Resource answered, possibly after redirects, and the final URL differs
    Redirected,
    /// HTTP server answered with a non-retryable 4xx/5xx status
    HttpErrorStatus,
    /// Transient failures persisted until the retry ceiling
    RetriesExhausted,
    /// Locator failed classification
    InvalidLocator,
    /// Scheme has no prober
    UnsupportedScheme,
    /// FTP directory listed but the file is not in it
    FtpNotFound,
    /// FTP CWD/LIST failed after connecting
    FtpListingFailed,
    /// FTP connect kept timing out
    FtpConnectTimeout,
    /// FTP connect failed with a non-timeout error
    FtpFatal,
    /// Run was cancelled before the locator was dispatched
    Cancelled,
    /// The task probing the locator panicked
    TaskFailed,
}

impl std::fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OutcomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeType::Reachable => "Reachable",
            OutcomeType::Redirected => "Reachable after redirect",
            OutcomeType::HttpErrorStatus => "HTTP error status",
            OutcomeType::RetriesExhausted => "Retries exhausted",
            OutcomeType::InvalidLocator => "Invalid locator",
            OutcomeType::UnsupportedScheme => "Unsupported scheme",
            OutcomeType::FtpNotFound => "FTP file not found",
            OutcomeType::FtpListingFailed => "FTP listing failed",
            OutcomeType::FtpConnectTimeout => "FTP connect timeout",
            OutcomeType::FtpFatal => "FTP connection error",
            OutcomeType::Cancelled => "Cancelled",
            OutcomeType::TaskFailed => "Probe task failed",
        }
    }

    /// Whether this outcome means the resource was reached.
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeType::Reachable | OutcomeType::Redirected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_outcome_type_as_str_unique() {
        let names: std::collections::HashSet<_> =
            OutcomeType::iter().map(|o| o.as_str()).collect();
        assert_eq!(names.len(), OutcomeType::iter().count());
    }

    #[test]
    fn test_probe_error_transient() {
        assert!(ProbeError::Network("reset".into()).is_transient());
        assert!(ProbeError::Timeout("elapsed".into()).is_transient());
        assert!(!ProbeError::protocol("530 Login incorrect").is_transient());
    }

    #[test]
    fn test_probe_error_from_io() {
        let timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(ProbeError::from(timeout).is_timeout());

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(ProbeError::from(refused), ProbeError::Network(_)));

        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "closed");
        assert!(matches!(ProbeError::from(eof), ProbeError::Protocol { .. }));
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProbeError::Protocol {
            code: Some(550),
            message: "No such file".into(),
        };
        assert_eq!(err.to_string(), "protocol error (550): No such file");
        assert_eq!(
            ProbeError::protocol("bad reply").to_string(),
            "protocol error: bad reply"
        );
    }
}
