//! Where finished measurements end up.
use crate::error::SinkError;
use csv::{QuoteStyle, Writer, WriterBuilder};
use skiload_core::Measurement;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub trait RecordSink {
    fn write(&mut self, measurement: &Measurement) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError>;
}

/// Header-less CSV, one `issued_at_ms,kind,latency_ms,status` row per measurement.
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
}

impl CsvSink<BufWriter<File>> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .from_writer(inner);
        Self { writer }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|err| SinkError::Io(io::Error::new(err.error().kind(), err.to_string())))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write(&mut self, measurement: &Measurement) -> Result<(), SinkError> {
        self.writer.write_record(&[
            measurement.issued_at_ms.to_string(),
            measurement.kind.to_string(),
            measurement.latency_ms.to_string(),
            measurement.status_code().to_string(),
        ])?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn write(&mut self, measurement: &Measurement) -> Result<(), SinkError> {
        (**self).write(measurement)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}
