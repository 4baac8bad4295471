//! The hook driver.
//!
//! Hook order is fixed at construction. On decode, row hooks run in
//! registration order, then each declared field runs its field hooks in
//! registration order followed by coercion. On encode, field hooks' `after`
//! run per field, then row hooks' `after` run in reverse registration order.

use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationResult};
use crate::models::{Record, Row};
use crate::schema::{FieldSchema, RecordType, UnknownFields};
use crate::validation::coerce;

use super::{AccumulatorPivotCodec, DelimitedListCodec, EmptyFieldNormalizer, FieldHook, RowHook};

/// Ordered row-level and field-level hooks.
#[derive(Debug, Default)]
pub struct Pipeline {
    row_hooks: Vec<Box<dyn RowHook>>,
    field_hooks: Vec<Box<dyn FieldHook>>,
}

impl Pipeline {
    /// An empty pipeline: coercion and structural checks only.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in hooks, in the only order that is correct.
    ///
    /// Empty-to-absent must run before the list split so that an optional
    /// list reads `""` as absent rather than as `[]`.
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        pipeline.push_row_hook(Box::new(EmptyFieldNormalizer));
        pipeline.push_row_hook(Box::new(AccumulatorPivotCodec));
        pipeline.push_field_hook(Box::new(DelimitedListCodec));
        pipeline
    }

    pub fn push_row_hook(&mut self, hook: Box<dyn RowHook>) {
        self.row_hooks.push(hook);
    }

    pub fn push_field_hook(&mut self, hook: Box<dyn FieldHook>) {
        self.field_hooks.push(hook);
    }

    /// Row hooks first, then field hooks.
    pub fn hook_names(&self) -> Vec<&'static str> {
        self.row_hooks
            .iter()
            .map(|h| h.name())
            .chain(self.field_hooks.iter().map(|h| h.name()))
            .collect()
    }

    pub fn decode(&self, record_type: &RecordType, row: Row) -> ValidationResult<Record> {
        let mut row = row;
        for hook in &self.row_hooks {
            row = hook.before(record_type, row)?;
        }

        let mut candidate = Map::new();
        let mut errors = Vec::new();

        for field in record_type.fields() {
            let Some(raw) = row.shift_remove(&field.name) else {
                // Missing required fields are reported by the structural check.
                if let Some(default) = &field.default {
                    candidate.insert(field.name.clone(), default.clone());
                }
                continue;
            };

            match self.decode_field(record_type, field, raw) {
                Ok(value) => {
                    candidate.insert(field.name.clone(), value);
                }
                Err(err) => errors.push(err),
            }
        }

        if let Some(err) = ValidationError::from_many(errors) {
            return Err(err);
        }

        if record_type.unknown_fields() == UnknownFields::Reject {
            // Handed to the structural check, which has no room for them.
            for (key, value) in row {
                candidate.insert(key, value);
            }
        }

        let candidate = Value::Object(candidate);
        record_type.structural().check(&candidate)?;

        let Value::Object(values) = candidate else {
            unreachable!("candidate record is always an object");
        };
        tracing::trace!(fields = values.len(), "decoded row");
        Ok(Record::new(values))
    }

    fn decode_field(
        &self,
        record_type: &RecordType,
        field: &FieldSchema,
        raw: Value,
    ) -> ValidationResult<Value> {
        let mut value = raw;
        for hook in &self.field_hooks {
            if hook.applies_to(record_type, field) {
                value = hook.before(record_type, field, value)?;
            }
        }
        coerce(&field.field_type, value)
            .map_err(|message| ValidationError::invalid_value(&field.name, message))
    }

    pub fn encode(&self, record_type: &RecordType, record: &Record) -> ValidationResult<Row> {
        let mut row = Row::new();

        for field in record_type.fields() {
            let mut value = record.get(&field.name).cloned().unwrap_or(Value::Null);
            for hook in &self.field_hooks {
                if hook.applies_to(record_type, field) {
                    value = hook.after(record_type, field, value)?;
                }
            }
            row.insert(field.name.clone(), value);
        }

        for hook in self.row_hooks.iter().rev() {
            row = hook.after(record_type, row)?;
        }

        tracing::trace!(columns = row.len(), "encoded row");
        Ok(row)
    }
}
