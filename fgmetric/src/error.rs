//! Error types for fgmetric.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`SchemaError`] - Invalid record type definitions (fatal, raised once at build time)
//! - [`InvalidTypeError`] - Misuse of the type introspection helpers
//! - [`ValidationError`] - A single row failed to decode (recoverable, per row)
//! - [`ResourceError`] - File open/read/write failures
//! - [`MetricError`] - Top-level error wrapping all of the above
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors raised while defining a [`crate::RecordType`].
///
/// These are never recoverable: the schema itself must be fixed.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The list delimiter is not exactly one character.
    #[error("List delimiter must be a single character: {0:?}")]
    MultiCharDelimiter(String),

    /// A counter field was wrapped in an optional union.
    #[error("Counter field '{0}' may not be optional")]
    OptionalAccumulator(String),

    /// More than one counter field was declared.
    #[error("Only one counter field per record type is supported, found: {}", .0.join(", "))]
    MultipleAccumulators(Vec<String>),

    /// The counter key type is not an enum.
    #[error("Counter fields must have an enum type parameter: {field} ({found})")]
    AccumulatorKeyNotEnum { field: String, found: String },

    /// Two fields share a name.
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    /// An enum was declared without members.
    #[error("Enum '{0}' has no members")]
    EmptyEnum(String),

    /// An enum declares the same token twice.
    #[error("Enum '{name}' declares member '{member}' more than once")]
    DuplicateEnumMember { name: String, member: String },

    /// A type expression names a type that does not exist.
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    /// A type expression could not be parsed.
    #[error("Invalid type expression '{expr}': {message}")]
    InvalidTypeSyntax { expr: String, message: String },

    /// The generated structural schema was rejected by the validator.
    #[error("Structural schema failed to compile: {0}")]
    StructuralSchema(String),

    /// A declarative schema description could not be parsed.
    #[error("Invalid schema description: {0}")]
    Description(#[from] serde_json::Error),

    /// A declarative schema description file could not be read.
    #[error("Cannot read schema description '{}': {source}", .path.display())]
    DescriptionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Introspection Errors
// =============================================================================

/// Raised when an optional-only operation is applied to a non-optional type.
#[derive(Debug, Error)]
#[error("Type is not optional: {0}")]
pub struct InvalidTypeError(pub String);

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors raised while decoding a single row.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A raw value could not be coerced to the declared type.
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// The coerced record failed the structural check.
    #[error("Validation failed: {}", .errors.join("; "))]
    Schema { errors: Vec<String> },

    /// A counter member column would overwrite a declared field when encoding.
    #[error("Counter member '{0}' collides with the declared field of the same name")]
    ColumnCollision(String),

    /// Several independent problems in the same row.
    #[error("{} validation errors: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<ValidationError>),

    /// The validated record could not be converted to the caller's type.
    #[error("Typed conversion failed: {0}")]
    Typed(#[from] serde_json::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Collapse a list of errors into one, or `None` if the list is empty.
    pub fn from_many(mut errors: Vec<ValidationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}

// =============================================================================
// Resource Errors
// =============================================================================

/// File access errors.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Failed to open an input file.
    #[error("Cannot open file '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create an output file.
    #[error("Cannot create file '{}': {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Row tokenizer failure.
    #[error("Delimited file error: {0}")]
    Csv(#[from] csv::Error),

    /// The input has no header line.
    #[error("Delimited file is empty (no header line)")]
    EmptyFile,

    /// A row handed to the writer has a column missing from the header.
    #[error("Row contains a column not present in the header: {0}")]
    UnexpectedColumn(String),
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Top-level error type for reading and writing records.
#[derive(Debug, Error)]
pub enum MetricError {
    /// Schema definition error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Validation error outside of a file context.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A data row failed validation.
    #[error("Line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: ValidationError,
    },

    /// File error.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
}

impl From<csv::Error> for MetricError {
    fn from(err: csv::Error) -> Self {
        Self::Resource(ResourceError::Csv(err))
    }
}

impl From<std::io::Error> for MetricError {
    fn from(err: std::io::Error) -> Self {
        Self::Resource(ResourceError::Io(err))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for schema definition.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for row validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for file access.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Result type for reader/writer operations.
pub type MetricResult<T> = Result<T, MetricError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let schema_err = SchemaError::MultiCharDelimiter(";;".into());
        let err: MetricError = schema_err.into();
        assert!(err.to_string().contains(";;"));

        let resource_err = ResourceError::EmptyFile;
        let err: MetricError = resource_err.into();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_invalid_value_format() {
        let err = ValidationError::invalid_value("count", "expected an integer, got 'abc'");
        let msg = err.to_string();
        assert!(msg.contains("count"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_from_many() {
        assert!(ValidationError::from_many(Vec::new()).is_none());

        let single = ValidationError::from_many(vec![ValidationError::invalid_value("a", "bad")]);
        assert!(matches!(single, Some(ValidationError::InvalidValue { .. })));

        let many = ValidationError::from_many(vec![
            ValidationError::invalid_value("a", "bad"),
            ValidationError::invalid_value("b", "worse"),
        ])
        .unwrap();
        let msg = many.to_string();
        assert!(msg.starts_with("2 validation errors"));
        assert!(msg.contains("'b'"));
    }

    #[test]
    fn test_row_error_carries_line() {
        let err = MetricError::Row {
            line: 3,
            source: ValidationError::invalid_value("count", "bad"),
        };
        assert!(err.to_string().starts_with("Line 3"));
    }
}
