//! Primitive coercion from cell text to typed JSON values.

use chrono::NaiveDate;
use serde_json::{Map, Number, Value};

use crate::models::{FieldType, ScalarType};

const TRUE_VALUES: &[&str] = &["true", "1", "yes", "y", "on", "t"];
const FALSE_VALUES: &[&str] = &["false", "0", "no", "n", "off", "f"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Coerce `value` to `ty`.
///
/// Strings are parsed; values that already have the right JSON kind pass.
/// Returns a human-readable message on failure.
pub fn coerce(ty: &FieldType, value: Value) -> Result<Value, String> {
    match ty {
        FieldType::Null => match value {
            Value::Null => Ok(Value::Null),
            other => Err(format!("expected no value, got {}", describe(&other))),
        },
        FieldType::Plain(scalar) => coerce_scalar(scalar, value),
        FieldType::List(element) => match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| coerce(element, item).map_err(|m| format!("element {i}: {m}")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Err(format!("expected a list, got {}", describe(&other))),
        },
        FieldType::Accumulator(key) => coerce_counts(key, value),
        FieldType::Union(members) => coerce_union(members, value),
    }
}

fn coerce_union(members: &[FieldType], value: Value) -> Result<Value, String> {
    if value.is_null() {
        return if members.contains(&FieldType::Null) {
            Ok(Value::Null)
        } else {
            Err("value is required".to_string())
        };
    }

    let mut messages = Vec::new();
    for member in members.iter().filter(|m| **m != FieldType::Null) {
        match coerce(member, value.clone()) {
            Ok(v) => return Ok(v),
            Err(message) => messages.push(format!("{member}: {message}")),
        }
    }
    Err(format!("no union member matched ({})", messages.join("; ")))
}

fn coerce_scalar(scalar: &ScalarType, value: Value) -> Result<Value, String> {
    if value.is_null() {
        return Err("value is required".to_string());
    }

    match scalar {
        ScalarType::Str => match value {
            Value::String(_) => Ok(value),
            other => Err(format!("expected a string, got {}", describe(&other))),
        },
        ScalarType::Int => coerce_int(value),
        ScalarType::Float => coerce_float(value),
        ScalarType::Bool => coerce_bool(value),
        ScalarType::Date => match value {
            Value::String(s) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
                .map_err(|e| format!("invalid date '{s}': {e}")),
            other => Err(format!("expected a date string, got {}", describe(&other))),
        },
        ScalarType::Enum(enum_type) => match value {
            Value::String(s) if enum_type.contains(&s) => Ok(Value::String(s)),
            Value::String(s) => Err(format!(
                "'{s}' is not a member of {} ({})",
                enum_type.name(),
                enum_type.members().join(", ")
            )),
            other => Err(format!("expected a string, got {}", describe(&other))),
        },
    }
}

fn coerce_int(value: Value) -> Result<Value, String> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("expected an integer, got '{s}'")),
        other => Err(format!("expected an integer, got {}", describe(&other))),
    }
}

fn coerce_float(value: Value) -> Result<Value, String> {
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("expected a finite number, got {}", describe(&value)))
}

fn coerce_bool(value: Value) -> Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value),
        Value::String(s) => {
            let lower = s.to_lowercase();
            if TRUE_VALUES.contains(&lower.as_str()) {
                Ok(Value::Bool(true))
            } else if FALSE_VALUES.contains(&lower.as_str()) {
                Ok(Value::Bool(false))
            } else {
                Err(format!("expected a boolean, got '{s}'"))
            }
        }
        other => Err(format!("expected a boolean, got {}", describe(&other))),
    }
}

/// Coerce each count to an integer and order enum keys by declaration.
///
/// Keys outside the enum are kept so the structural check can report them.
fn coerce_counts(key: &FieldType, value: Value) -> Result<Value, String> {
    let Value::Object(raw) = value else {
        return Err(format!("expected a mapping of counts, got {}", describe(&value)));
    };

    let mut counts = Map::new();
    if let FieldType::Plain(ScalarType::Enum(enum_type)) = key {
        for member in enum_type.members() {
            counts.insert(member.clone(), Value::from(0));
        }
    }

    for (k, v) in raw {
        let count = coerce_int(v).map_err(|m| format!("count for '{k}': {m}"))?;
        counts.insert(k, count);
    }
    Ok(Value::Object(counts))
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "no value".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Array(_) => "a list".to_string(),
        Value::Object(_) => "a mapping".to_string(),
    }
}
