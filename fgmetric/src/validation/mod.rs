//! Structural validation of decoded records.
//!
//! Validation happens in two steps:
//!
//! 1. [`coerce`] turns each field's raw value into the JSON kind its declared
//!    type calls for (`"42"` to `42`, `"2024-01-02"` to a canonical date).
//! 2. [`StructuralValidator`] checks the coerced record against a JSON Schema
//!    (Draft 7) generated from the record type: required fields, value kinds,
//!    enum membership, counter keys and non-negative counts, and unknown
//!    columns when the record type rejects them.
//!
//! The schema is generated and compiled once, when the record type is built.

pub mod coerce;

pub use coerce::coerce;

use jsonschema::Validator;
use serde_json::{json, Map, Value};

use crate::error::{SchemaError, SchemaResult, ValidationError, ValidationResult};
use crate::models::{FieldType, ScalarType};
use crate::schema::{FieldSchema, UnknownFields};

/// A compiled structural schema for one record type.
pub struct StructuralValidator {
    schema: Value,
    validator: Validator,
}

impl StructuralValidator {
    pub fn new(fields: &[FieldSchema], unknown_fields: UnknownFields) -> SchemaResult<Self> {
        let schema = record_schema(fields, unknown_fields);
        let validator = jsonschema::draft7::new(&schema)
            .map_err(|e| SchemaError::StructuralSchema(e.to_string()))?;
        Ok(Self { schema, validator })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Check a coerced record, collecting every violation.
    pub fn check(&self, record: &Value) -> ValidationResult<()> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(record)
            .map(|e| e.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Schema { errors })
        }
    }

    /// Quick check without collecting messages.
    pub fn is_valid(&self, record: &Value) -> bool {
        self.validator.is_valid(record)
    }
}

/// Draft-7 schema for a whole record.
pub fn record_schema(fields: &[FieldSchema], unknown_fields: UnknownFields) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in fields {
        properties.insert(field.name.clone(), type_schema(&field.field_type));
        if field.is_required() {
            required.push(Value::String(field.name.clone()));
        }
    }

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": unknown_fields == UnknownFields::Ignore,
    })
}

/// Draft-7 schema for one field type.
pub fn type_schema(ty: &FieldType) -> Value {
    match ty {
        FieldType::Null => json!({ "type": "null" }),
        FieldType::Plain(scalar) => scalar_schema(scalar),
        FieldType::List(element) => json!({
            "type": "array",
            "items": type_schema(element),
        }),
        FieldType::Accumulator(key) => match key.as_ref() {
            FieldType::Plain(ScalarType::Enum(enum_type)) => json!({
                "type": "object",
                "propertyNames": { "enum": enum_type.members() },
                "required": enum_type.members(),
                "additionalProperties": { "type": "integer", "minimum": 0 },
            }),
            _ => json!({
                "type": "object",
                "additionalProperties": { "type": "integer", "minimum": 0 },
            }),
        },
        FieldType::Union(members) => json!({
            "anyOf": members.iter().map(type_schema).collect::<Vec<_>>(),
        }),
    }
}

fn scalar_schema(scalar: &ScalarType) -> Value {
    match scalar {
        ScalarType::Str => json!({ "type": "string" }),
        ScalarType::Int => json!({ "type": "integer" }),
        ScalarType::Float => json!({ "type": "number" }),
        ScalarType::Bool => json!({ "type": "boolean" }),
        ScalarType::Date => json!({
            "type": "string",
            "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}$",
        }),
        ScalarType::Enum(enum_type) => json!({
            "type": "string",
            "enum": enum_type.members(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnumType;

    fn fields() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("name", FieldType::str()),
            FieldSchema::new("value", FieldType::optional(FieldType::int())),
            FieldSchema::new(
                "counts",
                FieldType::counter(EnumType::new("Kind", ["foo", "bar"]).unwrap()),
            ),
            FieldSchema::new("flag", FieldType::bool()).with_default(json!(false)),
        ]
    }

    #[test]
    fn test_record_schema_required() {
        let schema = record_schema(&fields(), UnknownFields::Ignore);
        assert_eq!(schema["required"], json!(["name", "value", "counts"]));
        assert_eq!(schema["additionalProperties"], json!(true));
        assert_eq!(schema["properties"]["value"]["anyOf"][1], json!({"type": "null"}));
    }

    #[test]
    fn test_valid_record() {
        let v = StructuralValidator::new(&fields(), UnknownFields::Reject).unwrap();
        let record = json!({"name": "x", "value": null, "counts": {"foo": 1, "bar": 0}, "flag": true});
        assert!(v.check(&record).is_ok());
        assert!(v.is_valid(&record));
    }

    #[test]
    fn test_invalid_records() {
        let v = StructuralValidator::new(&fields(), UnknownFields::Reject).unwrap();

        let negative = json!({"name": "x", "value": 1, "counts": {"foo": -1, "bar": 0}});
        assert!(v.check(&negative).is_err());

        let bad_key = json!({"name": "x", "value": 1, "counts": {"foo": 1, "bar": 0, "qux": 2}});
        assert!(v.check(&bad_key).is_err());

        let extra = json!({"name": "x", "value": 1, "counts": {"foo": 1, "bar": 0}, "extra": "?"});
        assert!(v.check(&extra).is_err());

        let missing = json!({"value": 1, "counts": {"foo": 1, "bar": 0}});
        let err = v.check(&missing).unwrap_err();
        match err {
            ValidationError::Schema { errors } => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("name"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
