//! Validated record instances.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationResult;

/// One raw row: column name to cell value, in column order.
///
/// Cells start out as strings. Row hooks may replace them with `null`
/// (absent), arrays or objects before the structural validator runs.
pub type Row = Map<String, Value>;

/// A validated, typed row.
///
/// Holds exactly one entry per declared field, in declaration order. Absent
/// values are `null`, list fields are arrays and the counter field (if any)
/// is an object holding every enum token, in declaration order, with its count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: Map<String, Value>,
}

impl Record {
    pub(crate) fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// The value of a declared field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Count for one key of a counter field.
    pub fn count(&self, field: &str, key: &str) -> Option<i64> {
        self.values.get(field)?.as_object()?.get(key)?.as_i64()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> Map<String, Value> {
        self.values
    }

    /// Convert into a caller-defined serde type.
    pub fn into_typed<T: DeserializeOwned>(self) -> ValidationResult<T> {
        Ok(serde_json::from_value(Value::Object(self.values))?)
    }
}
