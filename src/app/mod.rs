//! Run-level helpers used by the library entry point.
//!
//! This module provides input reading, progress logging, shutdown handling,
//! and statistics printing around an orchestrated run.

pub mod input;
pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use input::read_locators;
pub use logging::log_progress;
pub use shutdown::shutdown_gracefully;
pub use statistics::print_outcome_statistics;
