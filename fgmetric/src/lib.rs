//! # fgmetric - typed records in delimited text files
//!
//! fgmetric reads and writes tab-delimited "metric" files whose rows follow a
//! declared record type. Beyond plain scalar columns it supports two
//! compound field kinds:
//!
//! - **list fields**: a sequence stored in one cell, joined by a list delimiter (`1,2,3`)
//! - **counter fields**: a count per enum member, stored as one column per member
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  .tsv file  │────▶│ RecordReader│────▶│  Pipeline   │────▶│   Record    │
//! │ (header+rows│     │ (csv, BOM)  │     │ (hooks +    │     │ (validated) │
//! │             │◀────│ RecordWriter│◀────│  validator) │◀────│             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fgmetric::{FieldType, ReaderOptions, RecordReader, RecordType};
//!
//! let record_type = RecordType::builder()
//!     .field("name", FieldType::str())
//!     .field("values", FieldType::list(FieldType::int()))
//!     .build()?;
//!
//! for record in RecordReader::open("input.tsv", &record_type, &ReaderOptions::default())? {
//!     let record = record?;
//!     println!("{:?}", record.get("values"));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Field types, introspection, rows and records
//! - [`schema`] - Record types, their builder and declarative descriptions
//! - [`transform`] - Row and field hooks, and the pipeline that runs them
//! - [`validation`] - Coercion and the structural validator
//! - [`file`] - Reading and writing delimited files
//! - [`metric`] - Typed access through serde

// Core modules
pub mod error;
pub mod models;

// Schema definition
pub mod schema;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// File I/O
pub mod file;

// Typed access
pub mod metric;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    InvalidTypeError, MetricError, MetricResult, ResourceError, ResourceResult, SchemaError,
    SchemaResult, ValidationError, ValidationResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    has_optional_elements, is_accumulator, is_list, is_optional, unpack_optional, value_to_text,
    EnumType, FieldType, Record, Row, ScalarType,
};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{
    AccumulatorField, FieldDescription, FieldSchema, RecordType, RecordTypeBuilder,
    SchemaDescription, UnknownFields, DEFAULT_LIST_DELIMITER,
};

// =============================================================================
// Re-exports - Hooks
// =============================================================================

pub use transform::{
    AccumulatorPivotCodec, DelimitedListCodec, EmptyFieldNormalizer, FieldHook, Pipeline, RowHook,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{coerce, StructuralValidator};

// =============================================================================
// Re-exports - Files
// =============================================================================

pub use file::{
    LineTerminator, ReaderOptions, RecordReader, RecordWriter, TypedReader, WriterOptions,
    DEFAULT_DELIMITER,
};

pub use metric::Metric;
