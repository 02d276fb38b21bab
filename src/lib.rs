//! catalog_probe library: resource availability probing for open-data catalogs
//!
//! Catalog metadata lists resources by URL, and many of those URLs rot. This
//! library takes the raw locator strings, checks each one over HTTP(S) or FTP
//! without downloading it, and produces one normalized [`ProbeRecord`] per
//! input: status, content type, encoding, ETag, last modification and the
//! redirect target, if any.
//!
//! # Example
//!
//! ```no_run
//! use catalog_probe::{Config, run_probe};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: std::path::PathBuf::from("resources.txt"),
//!     output: Some(std::path::PathBuf::from("out/resources.csv")),
//!     max_concurrency: 8,
//!     ..Default::default()
//! };
//!
//! let report = run_probe(config).await?;
//! println!("Probed {} locators: {} reachable, {} unreachable",
//!          report.total_locators, report.successful, report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod config;
mod error_handling;
pub mod export;
pub mod ftp;
pub mod http;
pub mod initialization;
pub mod locator;
pub mod orchestrator;
pub mod record;
pub mod retry;

pub use app::read_locators;
pub use config::{Config, LogFormat, LogLevel, OutputFormat, ProbeVerb};
pub use error_handling::{
    categorize_reqwest_error, InitializationError, OutcomeType, ProbeError, ProbeStats, RunError,
};
pub use locator::{classify, Credentials, InvalidLocator, Locator, LocatorKind, ParentKey};
pub use orchestrator::Orchestrator;
pub use record::{ProbeRecord, RECORD_COLUMNS};
pub use retry::RetryPolicy;
pub use run::{run_probe, ProbeReport};

// Internal run module (wires input, orchestrator, sink and progress logging)
mod run {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use anyhow::{Context, Result};
    use log::{info, warn};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::app::{log_progress, print_outcome_statistics, read_locators, shutdown_gracefully};
    use crate::config::{Config, LOGGING_INTERVAL};
    use crate::export::{open_sink, write_records};
    use crate::orchestrator::Orchestrator;

    /// Results of a probing run.
    #[derive(Debug, Clone)]
    pub struct ProbeReport {
        /// Number of distinct locators read from the input
        pub total_locators: usize,
        /// Records whose resource was reached
        pub successful: usize,
        /// Records whose resource was not reached
        pub failed: usize,
        /// Records written to the sink
        pub written: usize,
        /// Output file (`None` for stdout)
        pub output: Option<PathBuf>,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs a probe with the provided configuration.
    ///
    /// Reads the locators, probes them, and streams the records to the
    /// configured sink. Ctrl-C stops dispatching new probes; locators not yet
    /// probed are still written, as cancelled.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The input file cannot be opened
    /// - The HTTP client or the output sink cannot be initialized
    /// - Writing a record fails
    /// - An FTP server refuses a connection and `abort_on_ftp_error` is set
    ///   (records are still written before returning)
    pub async fn run_probe(config: Config) -> Result<ProbeReport> {
        let locators = read_locators(&config.file).await?;
        let total_locators = locators.len();

        let orchestrator =
            Orchestrator::from_config(&config).context("Failed to initialize probers")?;
        let sink = open_sink(config.format, config.output.as_deref())?;

        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_records(rx, sink));

        let cancel = CancellationToken::new();
        let probe_cancel = CancellationToken::new();

        let stop_watching = cancel.child_token();
        let interrupt = probe_cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_ok() {
                        warn!("Interrupted, finishing in-flight probes");
                        interrupt.cancel();
                    }
                }
                _ = stop_watching.cancelled() => {}
            }
        });

        let start_time = Instant::now();
        let stats = orchestrator.stats();
        let cancel_logging = cancel.child_token();
        let stats_for_logging = Arc::clone(&stats);
        let logging_task = tokio::task::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(LOGGING_INTERVAL));
            // The first tick fires immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        log_progress(start_time, &stats_for_logging, total_locators);
                    }
                    _ = cancel_logging.cancelled() => {
                        break;
                    }
                }
            }
        });

        let outcome = orchestrator.run_into(&locators, tx, probe_cancel).await;

        let written = shutdown_gracefully(cancel, Some(logging_task), Some(writer_task))
            .await
            .context("Record writer task failed")??;

        let elapsed_seconds = start_time.elapsed().as_secs_f64();
        log_progress(start_time, &stats, total_locators);
        print_outcome_statistics(&stats, elapsed_seconds);

        outcome.context("Run aborted")?;

        if let Some(path) = &config.output {
            info!("Records saved in {}", path.display());
        }

        Ok(ProbeReport {
            total_locators,
            successful: stats.successful(),
            failed: stats.failed(),
            written,
            output: config.output.clone(),
            elapsed_seconds,
        })
    }
}
