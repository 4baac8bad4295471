//! Type introspection.
//!
//! Pure classification of a [`FieldType`] against the three shapes the field
//! codecs care about: optional, list and counter. Each check looks through at
//! most one layer of optional wrapping, so `list[int]` and `list[int] | null`
//! are both lists.

use crate::error::InvalidTypeError;

use super::field_type::FieldType;

/// True if `t` is a union of two or more members that includes the absent variant.
pub fn is_optional(t: &FieldType) -> bool {
    match t {
        FieldType::Union(members) => members.len() >= 2 && members.contains(&FieldType::Null),
        _ => false,
    }
}

/// Remove the absent variant from an optional type.
///
/// Returns the single remaining member, or a union of the remaining members
/// when there are several (`int | str | null` unpacks to `int | str`).
pub fn unpack_optional(t: &FieldType) -> Result<FieldType, InvalidTypeError> {
    if !is_optional(t) {
        return Err(InvalidTypeError(t.to_string()));
    }

    let FieldType::Union(members) = t else {
        return Err(InvalidTypeError(t.to_string()));
    };

    let rest = members.iter().filter(|m| **m != FieldType::Null).cloned();
    Ok(FieldType::union(rest))
}

/// `t` itself, or `t` with its absent variant removed if it is optional.
fn strip_optional(t: &FieldType) -> FieldType {
    unpack_optional(t).unwrap_or_else(|_| t.clone())
}

/// True if `t` is `list[T]` or `list[T] | null`.
pub fn is_list(t: &FieldType) -> bool {
    matches!(strip_optional(t), FieldType::List(_))
}

/// True if `t` is a list whose elements may individually be absent.
///
/// Independent of whether the list as a whole may be absent:
/// `list[int | null]` and `list[int | null] | null` both qualify,
/// `list[int] | null` does not.
pub fn has_optional_elements(t: &FieldType) -> bool {
    match strip_optional(t) {
        FieldType::List(element) => is_optional(&element),
        _ => false,
    }
}

/// True if `t` is `counter[K]` or `counter[K] | null`.
pub fn is_accumulator(t: &FieldType) -> bool {
    matches!(strip_optional(t), FieldType::Accumulator(_))
}

impl FieldType {
    pub fn is_optional(&self) -> bool {
        is_optional(self)
    }

    pub fn unpack_optional(&self) -> Result<FieldType, InvalidTypeError> {
        unpack_optional(self)
    }

    pub fn is_list(&self) -> bool {
        is_list(self)
    }

    pub fn has_optional_elements(&self) -> bool {
        has_optional_elements(self)
    }

    pub fn is_accumulator(&self) -> bool {
        is_accumulator(self)
    }
}
