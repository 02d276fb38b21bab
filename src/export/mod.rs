//! Record sinks.
//!
//! This module provides writers for probe records (CSV and JSON Lines, to a
//! file or stdout), the task loop that drains the record channel into a sink,
//! and the output directory reset used by the CLI before a run.

mod csv;
mod jsonl;
mod pipe;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::OutputFormat;
use crate::record::ProbeRecord;

pub use self::csv::CsvSink;
pub use jsonl::JsonlSink;
use pipe::IgnoreBrokenPipe;

/// Destination for probe records.
pub trait RecordSink {
    /// Writes one record.
    fn write(&mut self, record: &ProbeRecord) -> Result<()>;

    /// Flushes buffered output.
    fn flush(&mut self) -> Result<()>;
}

/// Opens a sink of the given format on `output`, or on stdout when `None`.
///
/// # Errors
///
/// Returns an error if the output file cannot be created or the CSV header
/// cannot be written.
pub fn open_sink(format: OutputFormat, output: Option<&Path>) -> Result<Box<dyn RecordSink + Send>> {
    let writer: Box<dyn Write + Send> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(IgnoreBrokenPipe::new(io::stdout())),
    };

    Ok(match format {
        OutputFormat::Csv => Box::new(CsvSink::new(writer)?),
        OutputFormat::Jsonl => Box::new(JsonlSink::new(writer)),
    })
}

/// Drains `records` into `sink` until every sender is gone.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns the first write error; records still queued are dropped.
pub async fn write_records(
    mut records: UnboundedReceiver<ProbeRecord>,
    mut sink: Box<dyn RecordSink + Send>,
) -> Result<usize> {
    let mut written = 0usize;
    while let Some(record) = records.recv().await {
        sink.write(&record)?;
        written += 1;
    }
    sink.flush()?;
    debug!("Wrote {} records", written);
    Ok(written)
}

/// Directory cleared by `--reset-output` for the output file `output`.
///
/// # Errors
///
/// Refuses the working directory (an output file given without a directory,
/// such as `records.csv`) and the filesystem root.
pub fn output_reset_dir(output: &Path) -> Result<&Path> {
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && dir != Path::new(".") => dir,
        _ => bail!(
            "Refusing to reset the working directory; place {} in a dedicated output directory",
            output.display()
        ),
    };

    if let Ok(resolved) = dir.canonicalize() {
        let is_cwd = std::env::current_dir()
            .and_then(|cwd| cwd.canonicalize())
            .is_ok_and(|cwd| cwd == resolved);
        if is_cwd || resolved.parent().is_none() {
            bail!(
                "Refusing to reset {}; place {} in a dedicated output directory",
                resolved.display(),
                output.display()
            );
        }
    }

    Ok(dir)
}

/// Deletes every file below `dir`, keeping the directory tree itself.
///
/// Symbolic links are left alone: they are neither followed nor removed.
/// A missing directory is not an error. Returns the number of files removed.
///
/// # Errors
///
/// Returns an error if a directory cannot be read or a file cannot be removed.
pub fn reset_output_dir(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        debug!("Output directory {} does not exist, nothing to reset", dir.display());
        return Ok(0);
    }

    let mut removed = 0usize;
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read output directory {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        // file_type() does not follow links
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", path.display()))?;

        if file_type.is_symlink() {
            debug!("Skipping link {}", path.display());
        } else if file_type.is_dir() {
            removed += reset_output_dir(&path)?;
        } else {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            removed += 1;
        }
    }

    info!("Removed {} files from {}", removed, dir.display());
    Ok(removed)
}
