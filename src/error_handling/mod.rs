//! Error handling and probe statistics.
//!
//! This module provides:
//! - Error type definitions (`ProbeError`, `RunError`, `InitializationError`)
//! - Categorization of transport errors into `ProbeError` variants
//! - Outcome statistics tracking
//!
//! `ProbeError` separates transient failures (network, timeout), which the
//! retry policy may retry, from protocol failures, which it never retries for FTP.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::categorize_reqwest_error;
pub use stats::ProbeStats;
pub use types::{InitializationError, OutcomeType, ProbeError, RunError};
