//! CSV record sink.
//!
//! One row per record, columns in [`RECORD_COLUMNS`] order. Absent values are
//! empty cells; bodies are written as lossy UTF-8.

use std::io::Write;

use anyhow::{Context, Result};
use csv::Writer;

use super::RecordSink;
use crate::record::{ProbeRecord, RECORD_COLUMNS};

/// Writes records as CSV with a header row.
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Creates the sink and writes the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = Writer::from_writer(inner);
        writer
            .write_record(RECORD_COLUMNS)
            .context("Failed to write CSV header")?;
        Ok(Self { writer })
    }

    /// Returns the underlying writer after flushing.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered rows cannot be flushed.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))
    }
}

fn cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write(&mut self, record: &ProbeRecord) -> Result<()> {
        let content = record
            .content()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();
        let status = record.status().map(|s| s.to_string()).unwrap_or_default();

        self.writer
            .write_record([
                content,
                status,
                record.url().to_string(),
                cell(record.encoding()),
                cell(record.etag()),
                cell(record.last_modified()),
                cell(record.mime_type()),
                cell(record.url_redirect()),
            ])
            .with_context(|| format!("Failed to write CSV row for {}", record.url()))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush CSV output")
    }
}
