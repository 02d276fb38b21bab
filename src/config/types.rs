//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_USER_AGENT, MAX_HOST_LENGTH, REQUEST_RETRIES_MAX, REQUEST_TIMEOUT_SECS,
    RETRY_BACKOFF_UNIT_MS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Serialization format for probe records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// One JSON object per line
    Jsonl,
}

/// HTTP method used when probing HTTP(S) locators.
///
/// `Head` is an identity-only verb: records produced with it never carry content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProbeVerb {
    /// Metadata-only request (default)
    Head,
    /// Full request; the body is attached to the record
    Get,
}

impl ProbeVerb {
    /// Returns the request method for this verb.
    pub fn method(self) -> reqwest::Method {
        match self {
            ProbeVerb::Head => reqwest::Method::HEAD,
            ProbeVerb::Get => reqwest::Method::GET,
        }
    }

    /// Whether responses to this verb carry no body.
    pub fn is_identity(self) -> bool {
        matches!(self, ProbeVerb::Head)
    }
}

/// Library configuration (no CLI dependencies).
///
/// This is the core configuration struct used by the library. It can be
/// constructed programmatically without any CLI dependencies.
///
/// # Examples
///
/// ```no_run
/// use catalog_probe::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     file: PathBuf::from("resources.txt"),
///     max_concurrency: 8,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// File to read locators from (`-` for stdin)
    pub file: PathBuf,

    /// Output file (stdout when absent)
    pub output: Option<PathBuf>,

    /// Output format
    pub format: OutputFormat,

    /// Clear the output file's directory before the run
    pub reset_output: bool,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Maximum attempts per locator (including the first)
    pub retries_max: usize,

    /// Linear backoff unit in milliseconds
    pub retry_backoff_ms: u64,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Maximum accepted host length
    pub max_host_length: usize,

    /// HTTP verb used for probing
    pub verb: ProbeVerb,

    /// Maximum number of locators (or FTP directory groups) probed at once.
    /// `1` reproduces the sequential reference behaviour.
    pub max_concurrency: usize,

    /// Abort the whole run when an FTP connection fails with a non-timeout error
    pub abort_on_ftp_error: bool,
}

impl Config {
    /// Per-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Backoff unit as a `Duration`.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("resources.txt"),
            output: None,
            format: OutputFormat::Csv,
            reset_output: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: REQUEST_TIMEOUT_SECS,
            retries_max: REQUEST_RETRIES_MAX,
            retry_backoff_ms: RETRY_BACKOFF_UNIT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_host_length: MAX_HOST_LENGTH,
            verb: ProbeVerb::Head,
            max_concurrency: 1,
            abort_on_ftp_error: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_probe_verb_identity() {
        assert!(ProbeVerb::Head.is_identity());
        assert!(!ProbeVerb::Get.is_identity());
        assert_eq!(ProbeVerb::Head.method(), reqwest::Method::HEAD);
        assert_eq!(ProbeVerb::Get.method(), reqwest::Method::GET);
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.timeout_seconds, 15);
        assert_eq!(config.retries_max, 4);
        assert_eq!(config.max_host_length, 64);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.verb, ProbeVerb::Head);
        assert_eq!(config.format, OutputFormat::Csv);
        assert!(!config.abort_on_ftp_error);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.retry_backoff(), Duration::from_secs(1));
    }
}
