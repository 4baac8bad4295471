//! Typed metrics.
//!
//! A metric is a serde struct paired with the [`RecordType`] describing its
//! file form. The record type is built once and shared, usually from a
//! `once_cell::sync::Lazy`:
//!
//! ```rust,ignore
//! use fgmetric::{FieldType, Metric, RecordType};
//! use once_cell::sync::Lazy;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Sample {
//!     name: String,
//!     values: Vec<i64>,
//! }
//!
//! static SAMPLE: Lazy<RecordType> = Lazy::new(|| {
//!     RecordType::builder()
//!         .field("name", FieldType::str())
//!         .field("values", FieldType::list(FieldType::int()))
//!         .build()
//!         .expect("valid record type")
//! });
//!
//! impl Metric for Sample {
//!     fn record_type() -> &'static RecordType {
//!         &SAMPLE
//!     }
//! }
//!
//! for sample in Sample::read("samples.tsv", &Default::default())? {
//!     let sample = sample?;
//! }
//! ```

use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MetricResult, ValidationResult};
use crate::file::{ReaderOptions, RecordReader, RecordWriter, TypedReader, WriterOptions};
use crate::models::Row;
use crate::schema::RecordType;

/// A serde type with a delimited-file representation.
pub trait Metric: Serialize + DeserializeOwned {
    fn record_type() -> &'static RecordType;

    /// Decode one raw row.
    fn from_row(row: Row) -> ValidationResult<Self> {
        Self::record_type().decode(row)?.into_typed()
    }

    /// Validate and encode into a raw row.
    fn to_row(&self) -> ValidationResult<Row> {
        let record_type = Self::record_type();
        let record = record_type.validate_typed(self)?;
        record_type.encode(&record)
    }

    /// Lazily read every metric in a file.
    fn read(
        path: impl AsRef<Path>,
        options: &ReaderOptions,
    ) -> MetricResult<TypedReader<'static, Self, File>> {
        Ok(RecordReader::open(path, Self::record_type(), options)?.typed())
    }

    /// Write a header and every metric to a file.
    fn write_all<'m, I>(path: impl AsRef<Path>, metrics: I, options: &WriterOptions) -> MetricResult<()>
    where
        Self: 'm,
        I: IntoIterator<Item = &'m Self>,
    {
        let mut writer = RecordWriter::create(path, Self::record_type(), options)?;
        for metric in metrics {
            writer.write_typed(metric)?;
        }
        writer.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MetricError, ValidationError};
    use crate::models::{EnumType, FieldType};
    use once_cell::sync::Lazy;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tally {
        name: String,
        hits: Option<Vec<Option<i64>>>,
        counts: BTreeMap<String, i64>,
    }

    static TALLY: Lazy<RecordType> = Lazy::new(|| {
        RecordType::builder()
            .field("name", FieldType::str())
            .field(
                "hits",
                FieldType::optional(FieldType::list(FieldType::optional(FieldType::int()))),
            )
            .field(
                "counts",
                FieldType::counter(EnumType::new("Kind", ["foo", "bar"]).unwrap()),
            )
            .build()
            .unwrap()
    });

    impl Metric for Tally {
        fn record_type() -> &'static RecordType {
            &TALLY
        }
    }

    fn tally(name: &str, hits: Option<Vec<Option<i64>>>, foo: i64, bar: i64) -> Tally {
        Tally {
            name: name.to_string(),
            hits,
            counts: BTreeMap::from([("foo".to_string(), foo), ("bar".to_string(), bar)]),
        }
    }

    #[test]
    fn test_from_row() {
        let row = serde_json::json!({"name": "Nils", "hits": "1,,3", "foo": "2"})
            .as_object()
            .cloned()
            .unwrap();
        let t = Tally::from_row(row).unwrap();
        assert_eq!(t, tally("Nils", Some(vec![Some(1), None, Some(3)]), 2, 0));
    }

    #[test]
    fn test_to_row() {
        let row = tally("Tim", None, 0, 4).to_row().unwrap();
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "hits", "foo", "bar"]);
        assert_eq!(row["hits"], serde_json::Value::Null);
        assert_eq!(row["bar"], 4);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.tsv");
        let metrics = vec![
            tally("Nils", Some(vec![Some(1), Some(2)]), 1, 2),
            tally("Tim", None, 0, 0),
            tally("Anna", Some(vec![]), 5, 0),
        ];

        Tally::write_all(&path, &metrics, &WriterOptions::default()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "name\thits\tfoo\tbar\nNils\t1,2\t1\t2\nTim\t\t0\t0\nAnna\t\t5\t0\n"
        );

        let back: Vec<Tally> = Tally::read(&path, &ReaderOptions::default())
            .unwrap()
            .collect::<MetricResult<_>>()
            .unwrap();
        // An empty optional list is written as an empty cell and reads back as absent.
        assert_eq!(back[..2], metrics[..2]);
        assert_eq!(back[2].hits, None);
    }

    #[test]
    fn test_read_missing_file() {
        let err = Tally::read("/definitely/not/here.tsv", &ReaderOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, MetricError::Resource(_)));
    }

    #[test]
    fn test_to_row_rejects_negative_count() {
        let err = tally("Nils", None, -1, 0).to_row().unwrap_err();
        assert!(matches!(err, ValidationError::Schema { .. }));
    }
}
