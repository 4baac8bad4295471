//! Domain models for fgmetric.
//!
//! - [`FieldType`] - Declared type of a field (plain, list, counter, union)
//! - [`ScalarType`] / [`EnumType`] - Primitive kinds and string enums
//! - [`Row`] - Raw column-name to cell mapping
//! - [`Record`] - A validated row
//!
//! The [`introspect`] submodule classifies field types for the codecs.

pub mod field_type;
pub mod introspect;
pub mod record;

pub use field_type::{EnumType, FieldType, ScalarType};
pub use introspect::{has_optional_elements, is_accumulator, is_list, is_optional, unpack_optional};
pub use record::{Record, Row};

use serde_json::Value;

/// Render a serialized value as cell text.
///
/// Absent becomes the empty string; strings are written verbatim; numbers and
/// booleans use their JSON spelling. Booleans are therefore written as
/// `true`/`false`, never `True`/`False`; reading accepts either case.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&Value::Null), "");
        assert_eq!(value_to_text(&json!("a b")), "a b");
        assert_eq!(value_to_text(&json!(42)), "42");
        assert_eq!(value_to_text(&json!(0.5)), "0.5");
        assert_eq!(value_to_text(&json!(true)), "true");
    }

    #[test]
    fn test_record_accessors() {
        let mut values = serde_json::Map::new();
        values.insert("name".into(), json!("Nils"));
        values.insert("counts".into(), json!({"foo": 1, "bar": 2}));
        let record = Record::new(values);

        assert_eq!(record.get("name"), Some(&json!("Nils")));
        assert_eq!(record.count("counts", "bar"), Some(2));
        assert_eq!(record.count("counts", "baz"), None);
        assert_eq!(record.count("name", "foo"), None);
    }
}
