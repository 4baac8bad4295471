//! Declarative record type descriptions.
//!
//! A JSON document describing a record type, for callers without a Rust type
//! at hand (the `fgmetric` binary, other languages):
//!
//! ```json
//! {
//!   "list_delimiter": ",",
//!   "unknown_fields": "ignore",
//!   "enums": { "Kind": ["foo", "bar", "baz"] },
//!   "fields": [
//!     { "name": "name", "type": "str" },
//!     { "name": "values", "type": "list[int | null]" },
//!     { "name": "counts", "type": "counter[Kind]" },
//!     { "name": "note", "type": "str?", "default": null }
//!   ]
//! }
//! ```
//!
//! Type grammar:
//!
//! ```text
//! type    := member ("|" member)*
//! member  := primary "?"?
//! primary := "null" | scalar | enum-name
//!          | "list" "[" type "]" | "counter" "[" type "]"
//!          | "(" type ")"
//! scalar  := "str" | "int" | "float" | "bool" | "date"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};
use crate::models::{EnumType, FieldType};

use super::{FieldSchema, RecordType, UnknownFields, DEFAULT_LIST_DELIMITER};

/// A whole record type, as written in a description file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    #[serde(default = "default_list_delimiter")]
    pub list_delimiter: String,
    #[serde(default)]
    pub unknown_fields: UnknownFields,
    /// Enum name to member tokens, in declaration order.
    #[serde(default)]
    pub enums: BTreeMap<String, Vec<String>>,
    pub fields: Vec<FieldDescription>,
}

/// One field of a [`SchemaDescription`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub type_expr: String,
    /// `"default": null` is a default of absent, distinct from no default.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
}

fn default_list_delimiter() -> String {
    DEFAULT_LIST_DELIMITER.to_string()
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SchemaDescription {
    pub fn from_json(text: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::DescriptionFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Resolve type expressions and build the record type.
    pub fn into_record_type(self) -> SchemaResult<RecordType> {
        let mut enums = BTreeMap::new();
        for (name, members) in self.enums {
            let enum_type = EnumType::new(name.clone(), members)?;
            enums.insert(name, enum_type);
        }

        let mut builder = RecordType::builder()
            .list_delimiter(self.list_delimiter)
            .unknown_fields(self.unknown_fields);

        for field in self.fields {
            let field_type = parse_field_type(&field.type_expr, &enums)?;
            let mut schema = FieldSchema::new(field.name, field_type);
            schema.default = field.default;
            builder = builder.field_schema(schema);
        }

        builder.build()
    }
}

// =============================================================================
// Type expressions
// =============================================================================

/// Parse a type expression against the declared enums.
pub fn parse_field_type(expr: &str, enums: &BTreeMap<String, EnumType>) -> SchemaResult<FieldType> {
    let tokens = tokenize(expr)?;
    let mut parser = TypeParser {
        expr,
        tokens,
        pos: 0,
        enums,
    };
    let ty = parser.parse_union()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error(format!("unexpected '{token}'")));
    }
    Ok(ty)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Open,
    Close,
    OpenParen,
    CloseParen,
    Pipe,
    Question,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => f.write_str(name),
            Token::Open => f.write_str("["),
            Token::Close => f.write_str("]"),
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::Pipe => f.write_str("|"),
            Token::Question => f.write_str("?"),
        }
    }
}

fn tokenize(expr: &str) -> SchemaResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ']' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '(' => {
                chars.next();
                tokens.push(Token::OpenParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::CloseParen);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '?' => {
                chars.next();
                tokens.push(Token::Question);
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(SchemaError::InvalidTypeSyntax {
                    expr: expr.to_string(),
                    message: format!("unexpected character '{other}'"),
                })
            }
        }
    }
    Ok(tokens)
}

struct TypeParser<'a> {
    expr: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    enums: &'a BTreeMap<String, EnumType>,
}

impl TypeParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::InvalidTypeSyntax {
            expr: self.expr.to_string(),
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: Token) -> SchemaResult<()> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(self.error(format!("expected '{expected}', found '{token}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn parse_union(&mut self) -> SchemaResult<FieldType> {
        let mut members = vec![self.parse_member()?];
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            members.push(self.parse_member()?);
        }
        Ok(FieldType::union(members))
    }

    fn parse_member(&mut self) -> SchemaResult<FieldType> {
        let ty = self.parse_primary()?;
        if self.peek() == Some(&Token::Question) {
            self.pos += 1;
            return Ok(FieldType::optional(ty));
        }
        Ok(ty)
    }

    fn parse_primary(&mut self) -> SchemaResult<FieldType> {
        match self.advance() {
            Some(Token::OpenParen) => {
                let ty = self.parse_union()?;
                self.expect(Token::CloseParen)?;
                Ok(ty)
            }
            Some(Token::Ident(name)) => self.parse_named(&name),
            Some(token) => Err(self.error(format!("unexpected '{token}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_named(&mut self, name: &str) -> SchemaResult<FieldType> {
        match name {
            "null" | "none" => Ok(FieldType::Null),
            "str" | "string" => Ok(FieldType::str()),
            "int" => Ok(FieldType::int()),
            "float" => Ok(FieldType::float()),
            "bool" => Ok(FieldType::bool()),
            "date" => Ok(FieldType::date()),
            "list" => {
                self.expect(Token::Open)?;
                let element = self.parse_union()?;
                self.expect(Token::Close)?;
                Ok(FieldType::list(element))
            }
            "counter" => {
                self.expect(Token::Open)?;
                let key = self.parse_union()?;
                self.expect(Token::Close)?;
                // Non-enum keys are rejected when the record type is built.
                Ok(FieldType::accumulator(key))
            }
            other => self
                .enums
                .get(other)
                .cloned()
                .map(FieldType::enumeration)
                .ok_or_else(|| SchemaError::UnknownType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enums() -> BTreeMap<String, EnumType> {
        let mut enums = BTreeMap::new();
        enums.insert(
            "Kind".to_string(),
            EnumType::new("Kind", ["foo", "bar", "baz"]).unwrap(),
        );
        enums
    }

    fn parse(expr: &str) -> SchemaResult<FieldType> {
        parse_field_type(expr, &enums())
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse("str").unwrap(), FieldType::str());
        assert_eq!(parse("string").unwrap(), FieldType::str());
        assert_eq!(parse(" int ").unwrap(), FieldType::int());
        assert_eq!(parse("date").unwrap(), FieldType::date());
        assert_eq!(parse("null").unwrap(), FieldType::Null);
    }

    #[test]
    fn test_parse_optional_forms_agree() {
        let expected = FieldType::optional(FieldType::int());
        assert_eq!(parse("int?").unwrap(), expected);
        assert_eq!(parse("int | null").unwrap(), expected);
        assert!(parse("null | int").unwrap().is_optional());
    }

    #[test]
    fn test_parse_nested() {
        assert_eq!(
            parse("list[int | null]").unwrap(),
            FieldType::list(FieldType::optional(FieldType::int()))
        );
        assert_eq!(
            parse("list[int]?").unwrap(),
            FieldType::optional(FieldType::list(FieldType::int()))
        );
        assert_eq!(
            parse("(int | str)?").unwrap(),
            FieldType::union([FieldType::int(), FieldType::str(), FieldType::Null])
        );
    }

    #[test]
    fn test_parse_enum_and_counter() {
        let kind = enums()["Kind"].clone();
        assert_eq!(parse("Kind").unwrap(), FieldType::enumeration(kind.clone()));
        assert_eq!(parse("counter[Kind]").unwrap(), FieldType::counter(kind));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("Colour"), Err(SchemaError::UnknownType(n)) if n == "Colour"));
        assert!(matches!(parse("list[int"), Err(SchemaError::InvalidTypeSyntax { .. })));
        assert!(matches!(parse("int int"), Err(SchemaError::InvalidTypeSyntax { .. })));
        assert!(matches!(parse(""), Err(SchemaError::InvalidTypeSyntax { .. })));
        assert!(matches!(parse("int & str"), Err(SchemaError::InvalidTypeSyntax { .. })));
    }

    #[test]
    fn test_description_into_record_type() {
        let description = SchemaDescription::from_json(
            r#"{
                "enums": {"Kind": ["foo", "bar", "baz"]},
                "fields": [
                    {"name": "name", "type": "str"},
                    {"name": "values", "type": "list[int | null]"},
                    {"name": "counts", "type": "counter[Kind]"},
                    {"name": "note", "type": "str?", "default": null}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(description.list_delimiter, ",");
        assert_eq!(description.fields[3].default, Some(Value::Null));
        assert_eq!(description.fields[0].default, None);

        let rt = description.into_record_type().unwrap();
        assert_eq!(
            rt.header_fieldnames(),
            ["name", "values", "foo", "bar", "baz", "note"]
        );
        assert_eq!(rt.optional_element_list_fields(), ["values"]);
        assert!(!rt.field("note").unwrap().is_required());
    }

    #[test]
    fn test_description_schema_errors_surface() {
        let err = SchemaDescription::from_json(
            r#"{"list_delimiter": "::", "fields": [{"name": "v", "type": "list[int]"}]}"#,
        )
        .unwrap()
        .into_record_type()
        .unwrap_err();
        assert!(matches!(err, SchemaError::MultiCharDelimiter(_)));

        let err = SchemaDescription::from_json(
            r#"{"fields": [{"name": "c", "type": "counter[int]"}]}"#,
        )
        .unwrap()
        .into_record_type()
        .unwrap_err();
        assert!(matches!(err, SchemaError::AccumulatorKeyNotEnum { .. }));

        assert!(matches!(
            SchemaDescription::from_json("{"),
            Err(SchemaError::Description(_))
        ));
    }
}
