//! Declared field types.
//!
//! A [`FieldType`] describes what a column holds. Optional fields are unions
//! that include [`FieldType::Null`], mirroring how a `T | None` annotation is
//! just a union with the absent variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

// =============================================================================
// Enumerated Types
// =============================================================================

/// A named set of string tokens (a string-valued enum).
///
/// Member tokens are used verbatim as column names when a counter field is
/// pivoted, so they must be unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumType {
    name: String,
    members: Vec<String>,
}

impl EnumType {
    /// Create an enum, rejecting empty or duplicated member lists.
    pub fn new<I, S>(name: impl Into<String>, members: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let members: Vec<String> = members.into_iter().map(Into::into).collect();

        if members.is_empty() {
            return Err(SchemaError::EmptyEnum(name));
        }

        for (i, member) in members.iter().enumerate() {
            if members[..i].contains(member) {
                return Err(SchemaError::DuplicateEnumMember {
                    name,
                    member: member.clone(),
                });
            }
        }

        Ok(Self { name, members })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member tokens in declaration order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, token: &str) -> bool {
        self.members.iter().any(|m| m == token)
    }
}

// =============================================================================
// Scalar Types
// =============================================================================

/// Primitive value kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// UTF-8 text, taken verbatim.
    Str,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean (`true`/`false`, `1`/`0`, `yes`/`no`, ...).
    Bool,
    /// Calendar date in ISO `YYYY-MM-DD` form.
    Date,
    /// One member of a string enum.
    Enum(EnumType),
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Str => write!(f, "str"),
            ScalarType::Int => write!(f, "int"),
            ScalarType::Float => write!(f, "float"),
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::Date => write!(f, "date"),
            ScalarType::Enum(e) => write!(f, "{}", e.name()),
        }
    }
}

// =============================================================================
// Field Types
// =============================================================================

/// The declared type of a field.
///
/// `Union` members are kept flat (no nested unions) and free of duplicates
/// when built through [`FieldType::union`] or [`FieldType::optional`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum FieldType {
    /// The absent variant. Only meaningful as a union member.
    Null,
    /// A single primitive value.
    Plain(ScalarType),
    /// A sequence stored as one delimiter-joined cell.
    List(Box<FieldType>),
    /// A per-key count, stored as one column per key. The key must be an enum.
    Accumulator(Box<FieldType>),
    /// Any one of several types.
    Union(Vec<FieldType>),
}

impl FieldType {
    pub fn str() -> Self {
        Self::Plain(ScalarType::Str)
    }

    pub fn int() -> Self {
        Self::Plain(ScalarType::Int)
    }

    pub fn float() -> Self {
        Self::Plain(ScalarType::Float)
    }

    pub fn bool() -> Self {
        Self::Plain(ScalarType::Bool)
    }

    pub fn date() -> Self {
        Self::Plain(ScalarType::Date)
    }

    pub fn enumeration(enum_type: EnumType) -> Self {
        Self::Plain(ScalarType::Enum(enum_type))
    }

    pub fn list(element: FieldType) -> Self {
        Self::List(Box::new(element))
    }

    /// A counter keyed by the members of `key`.
    pub fn counter(key: EnumType) -> Self {
        Self::Accumulator(Box::new(Self::enumeration(key)))
    }

    /// A counter over an arbitrary key type. Record types reject non-enum keys.
    pub fn accumulator(key: FieldType) -> Self {
        Self::Accumulator(Box::new(key))
    }

    /// `inner | null`.
    pub fn optional(inner: FieldType) -> Self {
        Self::union([inner, Self::Null])
    }

    /// Build a union, flattening nested unions and dropping duplicates.
    ///
    /// A union that collapses to a single member is returned as that member.
    pub fn union<I>(members: I) -> Self
    where
        I: IntoIterator<Item = FieldType>,
    {
        let mut flat: Vec<FieldType> = Vec::new();
        for member in members {
            let nested = match member {
                FieldType::Union(inner) => inner,
                other => vec![other],
            };
            for t in nested {
                if !flat.contains(&t) {
                    flat.push(t);
                }
            }
        }

        if flat.len() == 1 {
            flat.remove(0)
        } else {
            FieldType::Union(flat)
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Null => write!(f, "null"),
            FieldType::Plain(scalar) => write!(f, "{scalar}"),
            FieldType::List(element) => write!(f, "list[{element}]"),
            FieldType::Accumulator(key) => write!(f, "counter[{key}]"),
            FieldType::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color() -> EnumType {
        EnumType::new("Color", ["red", "green", "blue"]).unwrap()
    }

    #[test]
    fn test_enum_rejects_empty_and_duplicates() {
        assert!(matches!(
            EnumType::new("Empty", Vec::<String>::new()),
            Err(SchemaError::EmptyEnum(_))
        ));
        assert!(matches!(
            EnumType::new("Twice", ["a", "b", "a"]),
            Err(SchemaError::DuplicateEnumMember { member, .. }) if member == "a"
        ));
    }

    #[test]
    fn test_enum_membership() {
        let c = color();
        assert!(c.contains("green"));
        assert!(!c.contains("GREEN"));
        assert_eq!(c.members(), ["red", "green", "blue"]);
    }

    #[test]
    fn test_union_flattens_and_dedups() {
        let t = FieldType::union([
            FieldType::int(),
            FieldType::optional(FieldType::str()),
            FieldType::Null,
        ]);
        assert_eq!(
            t,
            FieldType::Union(vec![FieldType::int(), FieldType::str(), FieldType::Null])
        );
    }

    #[test]
    fn test_union_of_one_collapses() {
        assert_eq!(FieldType::union([FieldType::int(), FieldType::int()]), FieldType::int());
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::optional(FieldType::list(FieldType::int())).to_string(), "list[int] | null");
        assert_eq!(FieldType::list(FieldType::optional(FieldType::float())).to_string(), "list[float | null]");
        assert_eq!(FieldType::counter(color()).to_string(), "counter[Color]");
    }
}
