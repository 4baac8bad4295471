//! Field transformation pipeline.
//!
//! Rows pass through an ordered list of hooks around the structural
//! validator:
//!
//! ```text
//! decode:  raw row ─▶ EmptyFieldNormalizer ─▶ AccumulatorPivotCodec ─▶ per field:
//!          DelimitedListCodec::before ─▶ coerce ─▶ structural check ─▶ Record
//!
//! encode:  Record ─▶ per field: DelimitedListCodec::after ─▶ AccumulatorPivotCodec::after ─▶ row
//! ```
//!
//! - `normalize`: empty string to absent for optional fields
//! - `delimited_list`: split/join list cells
//! - `counter_pivot`: fold per-key columns into a counter and back
//! - `pipeline`: the driver loop

pub mod counter_pivot;
pub mod delimited_list;
pub mod normalize;
pub mod pipeline;

use std::fmt::Debug;

use serde_json::Value;

use crate::error::ValidationResult;
use crate::models::Row;
use crate::schema::{FieldSchema, RecordType};

pub use counter_pivot::AccumulatorPivotCodec;
pub use delimited_list::{join_list, split_list, DelimitedListCodec};
pub use normalize::EmptyFieldNormalizer;
pub use pipeline::Pipeline;

/// A transformation applied to a whole row.
pub trait RowHook: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs on the raw row before any per-field processing.
    fn before(&self, record_type: &RecordType, row: Row) -> ValidationResult<Row> {
        let _ = record_type;
        Ok(row)
    }

    /// Runs on the serialized row after all per-field processing.
    fn after(&self, record_type: &RecordType, row: Row) -> ValidationResult<Row> {
        let _ = record_type;
        Ok(row)
    }
}

/// A transformation applied to one field's value.
pub trait FieldHook: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this hook handles `field` at all.
    fn applies_to(&self, record_type: &RecordType, field: &FieldSchema) -> bool;

    /// Runs on the raw value before type coercion.
    fn before(
        &self,
        record_type: &RecordType,
        field: &FieldSchema,
        value: Value,
    ) -> ValidationResult<Value> {
        let _ = (record_type, field);
        Ok(value)
    }

    /// Runs on the default-serialized value.
    fn after(
        &self,
        record_type: &RecordType,
        field: &FieldSchema,
        value: Value,
    ) -> ValidationResult<Value> {
        let _ = (record_type, field);
        Ok(value)
    }
}
