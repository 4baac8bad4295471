//! Empty string to absent.

use serde_json::Value;

use crate::error::ValidationResult;
use crate::models::Row;
use crate::schema::RecordType;

use super::RowHook;

/// Replaces empty cells with `null` for fields declared optional.
///
/// Runs first, so later hooks only ever see one "no value" signal. Empty
/// cells in non-optional fields and columns matching no declared field are
/// left for the validator to accept or reject.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyFieldNormalizer;

impl RowHook for EmptyFieldNormalizer {
    fn name(&self) -> &'static str {
        "empty_field_normalizer"
    }

    fn before(&self, record_type: &RecordType, mut row: Row) -> ValidationResult<Row> {
        for (name, value) in row.iter_mut() {
            let Some(field) = record_type.field(name) else {
                continue;
            };
            if value.as_str() == Some("") && field.field_type.is_optional() {
                *value = Value::Null;
            }
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_only_optional_fields_are_normalized() {
        let rt = RecordType::builder()
            .field("name", FieldType::str())
            .field("value", FieldType::optional(FieldType::int()))
            .field("values", FieldType::list(FieldType::int()))
            .field("maybe", FieldType::optional(FieldType::list(FieldType::int())))
            .build()
            .unwrap();

        let out = EmptyFieldNormalizer
            .before(
                &rt,
                row(json!({"name": "", "value": "", "values": "", "maybe": "", "extra": ""})),
            )
            .unwrap();

        assert_eq!(
            Value::Object(out),
            json!({"name": "", "value": null, "values": "", "maybe": null, "extra": ""})
        );
    }

    #[test]
    fn test_non_empty_values_untouched() {
        let rt = RecordType::builder()
            .field("value", FieldType::optional(FieldType::int()))
            .build()
            .unwrap();

        let out = EmptyFieldNormalizer
            .before(&rt, row(json!({"value": "0"})))
            .unwrap();
        assert_eq!(out["value"], "0");

        let out = EmptyFieldNormalizer
            .before(&rt, row(json!({"value": " "})))
            .unwrap();
        assert_eq!(out["value"], " ");
    }
}
