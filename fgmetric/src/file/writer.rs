//! Record writer.

use std::borrow::Borrow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{MetricResult, ResourceError};
use crate::models::{value_to_text, Record, Row};
use crate::schema::RecordType;

use super::{warn_on_delimiter_clash, WriterOptions};

/// Writes records as delimited text.
///
/// The header is written when the writer is created. The underlying file is
/// closed when the writer is dropped, whether or not [`RecordWriter::finish`]
/// was called.
///
/// Cells are rendered with [`value_to_text`], so booleans come out lowercase.
pub struct RecordWriter<'a, W: Write> {
    record_type: &'a RecordType,
    writer: csv::Writer<W>,
    header: Vec<String>,
    rows: usize,
}

impl<'a> RecordWriter<'a, File> {
    /// Create (or truncate) `path` and write the header line.
    pub fn create(
        path: impl AsRef<Path>,
        record_type: &'a RecordType,
        options: &WriterOptions,
    ) -> MetricResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ResourceError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "created output");
        Self::from_writer(file, record_type, options)
    }
}

impl<'a, W: Write> RecordWriter<'a, W> {
    pub fn from_writer(
        output: W,
        record_type: &'a RecordType,
        options: &WriterOptions,
    ) -> MetricResult<Self> {
        warn_on_delimiter_clash(record_type, options.delimiter);

        let mut writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .terminator(options.line_terminator.to_csv())
            .has_headers(false)
            .from_writer(output);

        let header = record_type.header_fieldnames();
        writer.write_record(&header)?;

        Ok(Self {
            record_type,
            writer,
            header,
            rows: 0,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Encode and write one record.
    pub fn write(&mut self, record: &Record) -> MetricResult<()> {
        let row = self.record_type.encode(record)?;
        self.write_row(&row)
    }

    /// Validate a serializable value and write it.
    pub fn write_typed<T: Serialize>(&mut self, value: &T) -> MetricResult<()> {
        let record = self.record_type.validate_typed(value)?;
        self.write(&record)
    }

    /// Write an already-encoded row. Columns are taken in header order.
    pub fn write_row(&mut self, row: &Row) -> MetricResult<()> {
        if let Some(column) = row.keys().find(|k| !self.header.contains(*k)) {
            return Err(ResourceError::UnexpectedColumn(column.clone()).into());
        }

        let cells: Vec<String> = self
            .header
            .iter()
            .map(|name| row.get(name).map(value_to_text).unwrap_or_default())
            .collect();
        self.writer.write_record(&cells)?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_all<I>(&mut self, records: I) -> MetricResult<()>
    where
        I: IntoIterator,
        I::Item: Borrow<Record>,
    {
        for record in records {
            let record: &Record = record.borrow();
            self.write(record)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> MetricResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> MetricResult<W> {
        let rows = self.rows;
        let inner = self
            .writer
            .into_inner()
            .map_err(|e| ResourceError::Io(e.into_error()))?;
        tracing::debug!(rows, "finished writing");
        Ok(inner)
    }
}
