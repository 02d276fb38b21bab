//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `catalog_probe` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Output directory reset
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use catalog_probe::config::{
    DEFAULT_USER_AGENT, MAX_HOST_LENGTH, REQUEST_RETRIES_MAX, REQUEST_TIMEOUT_SECS,
    RETRY_BACKOFF_UNIT_MS,
};
use catalog_probe::export::{output_reset_dir, reset_output_dir};
use catalog_probe::initialization::init_logger_with;
use catalog_probe::{run_probe, Config, LogFormat, LogLevel, OutputFormat, ProbeVerb};

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Probe a locator list, CSV on stdout
/// catalog_probe resources.txt
///
/// # JSON Lines into a fresh output directory, eight probes at a time
/// catalog_probe resources.txt -o out/resources.jsonl --format jsonl --reset-output --max-concurrency 8
///
/// # Read locators from stdin and download bodies
/// cat resources.txt | catalog_probe - --verb get
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "catalog_probe",
    version,
    about = "Checks open-data catalog resource locators (HTTP, HTTPS, FTP) for availability."
)]
struct Cli {
    /// File with one locator per line (`-` for stdin)
    #[arg(value_parser)]
    file: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_parser)]
    output: Option<PathBuf>,

    /// Output format: csv|jsonl
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Delete every file below the output file's directory before probing
    /// (the output must be in a dedicated directory)
    #[arg(long, requires = "output")]
    reset_output: bool,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = REQUEST_TIMEOUT_SECS)]
    timeout_seconds: u64,

    /// Maximum attempts per locator, the first one included
    #[arg(long, env = "REQUEST_RETRIES_MAX", default_value_t = REQUEST_RETRIES_MAX)]
    retries_max: usize,

    /// Linear backoff unit in milliseconds (the n-th retry waits n units)
    #[arg(long, default_value_t = RETRY_BACKOFF_UNIT_MS)]
    retry_backoff_ms: u64,

    /// HTTP User-Agent header value
    #[arg(long, env = "USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Longest accepted host name, in characters
    #[arg(long, default_value_t = MAX_HOST_LENGTH)]
    max_host_length: usize,

    /// HTTP verb: head (metadata only) or get (body attached to the record)
    #[arg(long, value_enum, default_value_t = ProbeVerb::Head)]
    verb: ProbeVerb,

    /// Maximum number of locators (or FTP directories) probed at once
    #[arg(long, default_value_t = 1)]
    max_concurrency: usize,

    /// Stop the whole run when an FTP server refuses a connection
    #[arg(long)]
    abort_on_ftp_error: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            file: cli.file,
            output: cli.output,
            format: cli.format,
            reset_output: cli.reset_output,
            log_level: cli.log_level,
            log_format: cli.log_format,
            timeout_seconds: cli.timeout_seconds,
            retries_max: cli.retries_max,
            retry_backoff_ms: cli.retry_backoff_ms,
            user_agent: cli.user_agent,
            max_host_length: cli.max_host_length,
            verb: cli.verb,
            max_concurrency: cli.max_concurrency,
            abort_on_ftp_error: cli.abort_on_ftp_error,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    let _ = dotenvy::dotenv();

    let config = Config::from(Cli::parse());

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    if config.reset_output {
        if let Some(output) = config.output.as_deref() {
            let dir = output_reset_dir(output)?;
            reset_output_dir(dir).context("Failed to reset output directory")?;
        }
    }

    // Records may go to stdout, so the summary goes to stderr
    match run_probe(config).await {
        Ok(report) => {
            eprintln!(
                "✅ Probed {} locator{} ({} reachable, {} unreachable) in {:.1}s",
                report.total_locators,
                if report.total_locators == 1 { "" } else { "s" },
                report.successful,
                report.failed,
                report.elapsed_seconds
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("catalog_probe error: {:#}", e);
            process::exit(1);
        }
    }
}
