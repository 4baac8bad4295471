//! Delimited list cells.
//!
//! A `list[T]` field is stored as one cell with its elements joined by the
//! record type's list delimiter: `"1,2,3"` decodes to `[1, 2, 3]`.
//!
//! - The empty string decodes to an empty list, not `[""]`.
//! - For `list[T | null]`, empty segments decode to absent: `"1,,3"` is `[1, null, 3]`.
//! - Round trips are lossy when an element's text contains the delimiter.

use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::models::value_to_text;
use crate::schema::{FieldSchema, RecordType};

use super::FieldHook;

/// Split a cell into list elements.
pub fn split_list(text: &str, delimiter: char, optional_elements: bool) -> Vec<Value> {
    if text.is_empty() {
        return Vec::new();
    }

    text.split(delimiter)
        .map(|segment| {
            if optional_elements && segment.is_empty() {
                Value::Null
            } else {
                Value::String(segment.to_string())
            }
        })
        .collect()
}

/// Join serialized list elements into a cell. Absent elements become empty segments.
pub fn join_list(elements: &[Value], delimiter: char) -> String {
    let mut out = String::new();
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(&value_to_text(element));
    }
    out
}

/// Splits list cells before coercion and joins them after serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedListCodec;

impl FieldHook for DelimitedListCodec {
    fn name(&self) -> &'static str {
        "delimited_list"
    }

    fn applies_to(&self, record_type: &RecordType, field: &FieldSchema) -> bool {
        record_type.is_list_field(&field.name)
    }

    fn before(
        &self,
        record_type: &RecordType,
        field: &FieldSchema,
        value: Value,
    ) -> ValidationResult<Value> {
        // Non-string values come from programmatic construction; leave them be.
        let Value::String(text) = value else {
            return Ok(value);
        };

        let elements = split_list(
            &text,
            record_type.list_delimiter(),
            record_type.has_optional_elements(&field.name),
        );
        Ok(Value::Array(elements))
    }

    fn after(
        &self,
        record_type: &RecordType,
        field: &FieldSchema,
        value: Value,
    ) -> ValidationResult<Value> {
        match value {
            Value::Array(elements) => Ok(Value::String(join_list(
                &elements,
                record_type.list_delimiter(),
            ))),
            // an absent optional list
            Value::Null => Ok(Value::Null),
            // only reachable with a record validated against another record type
            other => Err(ValidationError::invalid_value(
                &field.name,
                format!("expected a list, got {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;
    use serde_json::json;

    #[test]
    fn test_split_empty_is_empty_list() {
        assert!(split_list("", ',', false).is_empty());
        assert!(split_list("", ',', true).is_empty());
    }

    #[test]
    fn test_split_plain() {
        assert_eq!(split_list("1,2,3", ',', false), vec![json!("1"), json!("2"), json!("3")]);
        assert_eq!(split_list("a,,c", ',', false), vec![json!("a"), json!(""), json!("c")]);
        assert_eq!(split_list("1;2", ';', false), vec![json!("1"), json!("2")]);
    }

    #[test]
    fn test_split_optional_elements() {
        assert_eq!(split_list("a,,c", ',', true), vec![json!("a"), Value::Null, json!("c")]);
        assert_eq!(split_list(",", ',', true), vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_join() {
        assert_eq!(join_list(&[json!(1), Value::Null, json!(3)], ','), "1,,3");
        assert_eq!(join_list(&[json!("x")], ';'), "x");
        assert_eq!(join_list(&[], ','), "");
        assert_eq!(join_list(&[json!(0.5), json!(true)], '|'), "0.5|true");
    }

    #[test]
    fn test_join_split_roundtrip() {
        let items = vec![json!("a"), json!("b c"), json!("d")];
        assert_eq!(split_list(&join_list(&items, ','), ',', false), items);
    }

    #[test]
    fn test_lossy_when_element_contains_delimiter() {
        let joined = join_list(&[json!("a,b"), json!("c")], ',');
        assert_eq!(joined, "a,b,c");
        assert_eq!(split_list(&joined, ',', false).len(), 3);
    }

    #[test]
    fn test_hook_passes_non_strings_through() {
        let rt = RecordType::builder()
            .field("values", FieldType::list(FieldType::int()))
            .build()
            .unwrap();
        let field = rt.field("values").unwrap();

        assert_eq!(
            DelimitedListCodec.before(&rt, field, json!([1, 2])).unwrap(),
            json!([1, 2])
        );
        assert_eq!(
            DelimitedListCodec.before(&rt, field, Value::Null).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_hook_uses_record_delimiter() {
        let rt = RecordType::builder()
            .field("values", FieldType::list(FieldType::optional(FieldType::int())))
            .list_delimiter(";")
            .build()
            .unwrap();
        let field = rt.field("values").unwrap();

        assert_eq!(
            DelimitedListCodec.before(&rt, field, json!("1;;3")).unwrap(),
            json!(["1", null, "3"])
        );
        assert_eq!(
            DelimitedListCodec.after(&rt, field, json!([1, null, 3])).unwrap(),
            json!("1;;3")
        );
    }

    #[test]
    fn test_join_rejects_non_sequence() {
        let list_type = RecordType::builder()
            .field("values", FieldType::list(FieldType::int()))
            .build()
            .unwrap();
        let text_type = RecordType::builder()
            .field("values", FieldType::str())
            .build()
            .unwrap();

        let record = text_type.validate_value(json!({"values": "1,2"})).unwrap();
        let err = list_type.encode(&record).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "values"));
    }
}
