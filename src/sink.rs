/// Output sinks for mapped values.
///
/// Values are handed on to the loader either as JSON lines (one
/// [`ETLValue`] object per line) or as CSV with a header row.
use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::mapping::ETLValue;

/// Output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

/// Destination for the values of mapped rows.
pub trait ValueSink {
    /// Write the values produced for one row.
    fn write(&mut self, values: &[ETLValue]) -> Result<()>;

    /// Flush any buffered output.
    fn finish(&mut self) -> Result<()>;
}

impl<T: ValueSink + ?Sized> ValueSink for Box<T> {
    fn write(&mut self, values: &[ETLValue]) -> Result<()> {
        (**self).write(values)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ValueSink for JsonLinesSink<W> {
    fn write(&mut self, values: &[ETLValue]) -> Result<()> {
        for value in values {
            serde_json::to_writer(&mut self.writer, value).context("failed to encode value")?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("failed to flush output")
    }
}

/// Writes CSV rows under an `objectId,archetype,...` header.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush csv output: {}", e.error()))
    }
}

impl<W: Write> ValueSink for CsvSink<W> {
    fn write(&mut self, values: &[ETLValue]) -> Result<()> {
        for value in values {
            self.writer
                .serialize(value)
                .context("failed to encode value")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("failed to flush output")
    }
}

/// Create a sink writing `format` to `writer`.
pub fn create<'w>(format: OutputFormat, writer: Box<dyn Write + 'w>) -> Box<dyn ValueSink + 'w> {
    match format {
        OutputFormat::Json => Box::new(JsonLinesSink::new(writer)),
        OutputFormat::Csv => Box::new(CsvSink::new(writer)),
    }
}
