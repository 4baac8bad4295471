//! Lazy record reader.

use std::fs::File;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{MetricError, MetricResult, ResourceError};
use crate::models::{Record, Row};
use crate::schema::RecordType;

use super::{warn_on_delimiter_clash, ReaderOptions};

/// Reads a delimited file one validated [`Record`] at a time.
///
/// The iterator yields `Err(MetricError::Row { .. })` for the first row that
/// fails to decode and then ends. Records yielded before it stay valid.
pub struct RecordReader<'a, R: Read> {
    record_type: &'a RecordType,
    reader: csv::Reader<R>,
    headers: Vec<String>,
    line: u64,
    done: bool,
}

impl<'a> RecordReader<'a, File> {
    /// Open `path` and read its header line.
    pub fn open(
        path: impl AsRef<Path>,
        record_type: &'a RecordType,
        options: &ReaderOptions,
    ) -> MetricResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ResourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened input");
        Self::from_reader(file, record_type, options)
    }
}

impl<'a, R: Read> RecordReader<'a, R> {
    pub fn from_reader(
        input: R,
        record_type: &'a RecordType,
        options: &ReaderOptions,
    ) -> MetricResult<Self> {
        warn_on_delimiter_clash(record_type, options.delimiter);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        let mut header = StringRecord::new();
        if !reader.read_record(&mut header)? {
            return Err(ResourceError::EmptyFile.into());
        }

        // csv drops a leading UTF-8 byte order mark itself.
        let headers: Vec<String> = header.iter().map(str::to_string).collect();

        let line = header.position().map_or(1, |p| p.line());
        tracing::debug!(columns = headers.len(), "read header");

        Ok(Self {
            record_type,
            reader,
            headers,
            line,
            done: false,
        })
    }

    /// Column names from the header line.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Line number of the most recently read row (the header is line 1).
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn record_type(&self) -> &'a RecordType {
        self.record_type
    }

    /// Deserialize each record into `T` instead.
    pub fn typed<T: DeserializeOwned>(self) -> TypedReader<'a, T, R> {
        TypedReader {
            inner: self,
            _marker: PhantomData,
        }
    }

    /// Pair cells with column names. Missing cells are absent, extra cells dropped.
    fn to_row(&self, cells: &StringRecord) -> Row {
        if cells.len() > self.headers.len() {
            tracing::warn!(
                line = self.line,
                expected = self.headers.len(),
                found = cells.len(),
                "dropping cells beyond the header"
            );
        }

        let mut row = Row::new();
        for (i, name) in self.headers.iter().enumerate() {
            let value = cells
                .get(i)
                .map_or(Value::Null, |cell| Value::String(cell.to_string()));
            row.insert(name.clone(), value);
        }
        row
    }
}

impl<R: Read> Iterator for RecordReader<'_, R> {
    type Item = MetricResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // Empty lines never reach us; csv skips them.
        let mut cells = StringRecord::new();
        match self.reader.read_record(&mut cells) {
            Ok(true) => {}
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(err) => {
                self.done = true;
                return Some(Err(err.into()));
            }
        }
        self.line = cells.position().map_or(self.line + 1, |p| p.line());

        let row = self.to_row(&cells);
        match self.record_type.decode(row) {
            Ok(record) => Some(Ok(record)),
            Err(source) => {
                self.done = true;
                tracing::debug!(line = self.line, error = %source, "row failed to decode");
                Some(Err(MetricError::Row {
                    line: self.line,
                    source,
                }))
            }
        }
    }
}

/// A [`RecordReader`] that deserializes each record into `T`.
pub struct TypedReader<'a, T, R: Read> {
    inner: RecordReader<'a, R>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, R: Read> TypedReader<'a, T, R> {
    pub fn headers(&self) -> &[String] {
        self.inner.headers()
    }
}

impl<T: DeserializeOwned, R: Read> Iterator for TypedReader<'_, T, R> {
    type Item = MetricResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.inner.next()? {
            Ok(record) => record,
            Err(err) => return Some(Err(err)),
        };

        match record.into_typed() {
            Ok(value) => Some(Ok(value)),
            Err(source) => {
                self.inner.done = true;
                Some(Err(MetricError::Row {
                    line: self.inner.line,
                    source,
                }))
            }
        }
    }
}
