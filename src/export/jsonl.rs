//! JSON Lines record sink.
//!
//! One JSON object per line; absent values are `null`.

use std::io::Write;

use anyhow::{Context, Result};

use super::RecordSink;
use crate::record::ProbeRecord;

/// Writes records as newline-delimited JSON.
pub struct JsonlSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonlSink<W> {
    fn write(&mut self, record: &ProbeRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)
            .with_context(|| format!("Failed to serialize record for {}", record.url()))?;
        self.writer
            .write_all(b"\n")
            .context("Failed to write JSONL output")
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush JSONL output")
    }
}
