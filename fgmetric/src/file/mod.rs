//! Delimited text files of records.
//!
//! ```text
//! ┌──────────────┐  rows  ┌──────────────┐ records ┌──────────────┐
//! │  .tsv file   │───────▶│ RecordReader │────────▶│    caller    │
//! └──────────────┘        └──────────────┘         └──────────────┘
//! ┌──────────────┐  rows  ┌──────────────┐ records ┌──────────────┐
//! │  .tsv file   │◀───────│ RecordWriter │◀────────│    caller    │
//! └──────────────┘        └──────────────┘         └──────────────┘
//! ```
//!
//! The first line of a file is the header and names the columns. Every
//! following line is one row. Rows are decoded lazily, one per `next()`.
//!
//! The row delimiter (tab by default) should differ from the record type's
//! list delimiter. Nothing enforces this; opening a reader or writer with the
//! two equal logs a warning.

pub mod reader;
pub mod writer;

use serde::{Deserialize, Serialize};

use crate::schema::RecordType;

pub use reader::{RecordReader, TypedReader};
pub use writer::RecordWriter;

/// Default row delimiter.
pub const DEFAULT_DELIMITER: u8 = b'\t';

/// Options for [`RecordReader`].
///
/// A leading UTF-8 byte order mark is always dropped from the header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderOptions {
    /// Single-byte field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// Line ending written after each row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    #[default]
    Lf,
    CrLf,
}

impl LineTerminator {
    pub(crate) fn to_csv(self) -> csv::Terminator {
        match self {
            LineTerminator::Lf => csv::Terminator::Any(b'\n'),
            LineTerminator::CrLf => csv::Terminator::CRLF,
        }
    }
}

/// Options for [`RecordWriter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterOptions {
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,

    #[serde(default)]
    pub line_terminator: LineTerminator,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            line_terminator: LineTerminator::default(),
        }
    }
}

fn default_delimiter() -> u8 {
    DEFAULT_DELIMITER
}

/// Warn if list cells would be ambiguous against the row delimiter.
pub(crate) fn warn_on_delimiter_clash(record_type: &RecordType, delimiter: u8) {
    if char::from(delimiter) == record_type.list_delimiter() {
        tracing::warn!(
            delimiter = %char::from(delimiter).escape_default(),
            "row delimiter equals the list delimiter; list cells will not round-trip"
        );
    }
}
