//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the application,
//! including timeouts, retry ceilings, and validation limits.

// constants (used as defaults)
/// Progress logging interval in seconds
pub const LOGGING_INTERVAL: u64 = 5;

// Network operation timeouts
/// Per-request timeout in seconds (HTTP request or FTP control/data read)
pub const REQUEST_TIMEOUT_SECS: u64 = 15;
/// TCP connection timeout in seconds
/// Kept below the request timeout so an unreachable host fails fast
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent string for HTTP requests.
///
/// Identifies the prober to catalog hosts so operators can recognise the traffic.
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str = concat!("catalog-probe/", env!("CARGO_PKG_VERSION"));

// Retry strategy
/// Maximum number of attempts per locator (including the initial attempt)
pub const REQUEST_RETRIES_MAX: usize = 4;
/// Linear backoff unit in milliseconds; the n-th retry waits `n * unit`
pub const RETRY_BACKOFF_UNIT_MS: u64 = 1000;
/// HTTP status codes treated as transient (retried with backoff)
pub const RETRYABLE_STATUS_CODES: &[u16] = &[408, 502, 503, 504];

// Locator validation
/// Maximum accepted host length in characters
pub const MAX_HOST_LENGTH: usize = 64;

// Redirect handling
/// Maximum number of redirect hops to follow
/// Prevents infinite redirect loops and excessive request chains
pub const MAX_REDIRECT_HOPS: usize = 10;

// FTP
/// Default FTP control port
pub const FTP_DEFAULT_PORT: u16 = 21;
/// Username used when a locator carries no credentials
pub const FTP_ANONYMOUS_USER: &str = "anonymous";
/// Password used for anonymous logins
pub const FTP_ANONYMOUS_PASSWORD: &str = "anonymous@";
