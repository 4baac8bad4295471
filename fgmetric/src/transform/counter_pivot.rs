//! Counter pivot tables.
//!
//! A `counter[E]` field is stored wide, one column per member of `E`:
//!
//! ```text
//! name  foo  bar  baz        {name: "Nils", counts: {foo: 1, bar: 2, baz: 0}}
//! Nils  1    2    0     <─▶
//! ```
//!
//! Decoding folds the member columns into a single object under the counter
//! field's name, seeding every member with 0. Encoding expands the object
//! back out in enum declaration order.
//!
//! A declared field may share its name with a member token. Decoding leaves
//! that column to the declared field; encoding such a record fails with
//! [`ValidationError::ColumnCollision`], since the two columns cannot both
//! be written.

use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationResult};
use crate::models::Row;
use crate::schema::RecordType;

use super::RowHook;

/// Folds per-member columns into the counter field and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccumulatorPivotCodec;

impl RowHook for AccumulatorPivotCodec {
    fn name(&self) -> &'static str {
        "accumulator_pivot"
    }

    fn before(&self, record_type: &RecordType, mut row: Row) -> ValidationResult<Row> {
        let Some(acc) = record_type.accumulator() else {
            return Ok(row);
        };

        // A pre-built counter was supplied; the validator decides if it is usable.
        if row.contains_key(&acc.name) {
            return Ok(row);
        }

        let mut counts = Map::new();
        for member in acc.key.members() {
            counts.insert(member.clone(), Value::from(0));
        }

        let claimed: Vec<String> = row
            .keys()
            .filter(|key| record_type.field(key).is_none() && acc.key.contains(key))
            .cloned()
            .collect();

        for key in claimed {
            if let Some(value) = row.shift_remove(&key) {
                counts.insert(key, value);
            }
        }

        row.insert(acc.name.clone(), Value::Object(counts));
        Ok(row)
    }

    fn after(&self, record_type: &RecordType, mut row: Row) -> ValidationResult<Row> {
        let Some(acc) = record_type.accumulator() else {
            return Ok(row);
        };

        let Some(Value::Object(mut counts)) = row.shift_remove(&acc.name) else {
            return Ok(row);
        };

        if let Some(member) = acc.key.members().iter().find(|m| row.contains_key(*m)) {
            return Err(ValidationError::ColumnCollision(member.clone()));
        }

        for member in acc.key.members() {
            let count = counts.shift_remove(member).unwrap_or_else(|| Value::from(0));
            row.insert(member.clone(), count);
        }
        Ok(row)
    }
}
