//! Record type definitions.
//!
//! A [`RecordType`] is built once through [`RecordTypeBuilder`] and is
//! immutable afterward. Building checks every schema invariant up front, so a
//! bad definition fails before the first row is read:
//!
//! - the list delimiter is exactly one character
//! - field names are unique
//! - at most one counter field, never optional, keyed by an enum
//!
//! The derived lookups used by the codecs (list fields, lists with optional
//! elements, the counter field) are computed here and stored alongside the
//! fields.
//!
//! # Example
//!
//! ```rust,ignore
//! use fgmetric::{EnumType, FieldType, RecordType};
//!
//! let kind = EnumType::new("Kind", ["foo", "bar", "baz"])?;
//! let record_type = RecordType::builder()
//!     .field("name", FieldType::str())
//!     .field("values", FieldType::list(FieldType::int()))
//!     .field("counts", FieldType::counter(kind))
//!     .build()?;
//!
//! assert_eq!(record_type.header_fieldnames(), ["name", "values", "foo", "bar", "baz"]);
//! ```

pub mod description;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult, ValidationError, ValidationResult};
use crate::models::{EnumType, FieldType, Record, Row, ScalarType};
use crate::transform::{FieldHook, Pipeline, RowHook};
use crate::validation::StructuralValidator;

pub use description::{FieldDescription, SchemaDescription};

/// Default delimiter for list fields.
pub const DEFAULT_LIST_DELIMITER: char = ',';

// =============================================================================
// Field Schema
// =============================================================================

/// One declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    /// Used when the field's column is missing from a row. Taken as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// What to do with row columns that match no declared field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFields {
    /// Drop them silently.
    #[default]
    Ignore,
    /// Fail the row.
    Reject,
}

/// The single counter field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorField {
    pub name: String,
    /// Position of the field among the declared fields.
    pub position: usize,
    pub key: EnumType,
}

// =============================================================================
// Record Type
// =============================================================================

/// Schema for one kind of delimited-file row.
pub struct RecordType {
    fields: Vec<FieldSchema>,
    index: HashMap<String, usize>,
    list_delimiter: char,
    unknown_fields: UnknownFields,
    list_fields: HashSet<String>,
    optional_element_list_fields: HashSet<String>,
    accumulator: Option<AccumulatorField>,
    pipeline: Pipeline,
    structural: StructuralValidator,
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("fields", &self.fields)
            .field("list_delimiter", &self.list_delimiter)
            .field("unknown_fields", &self.unknown_fields)
            .field("accumulator", &self.accumulator)
            .field("hooks", &self.pipeline.hook_names())
            .finish()
    }
}

impl RecordType {
    pub fn builder() -> RecordTypeBuilder {
        RecordTypeBuilder::new()
    }

    /// Declared fields, in order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn list_delimiter(&self) -> char {
        self.list_delimiter
    }

    pub fn unknown_fields(&self) -> UnknownFields {
        self.unknown_fields
    }

    pub fn is_list_field(&self, name: &str) -> bool {
        self.list_fields.contains(name)
    }

    pub fn has_optional_elements(&self, name: &str) -> bool {
        self.optional_element_list_fields.contains(name)
    }

    /// Names of all list fields, in declaration order.
    pub fn list_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| self.list_fields.contains(*name))
            .collect()
    }

    /// Names of list fields whose elements may be absent, in declaration order.
    pub fn optional_element_list_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| self.optional_element_list_fields.contains(*name))
            .collect()
    }

    pub fn accumulator(&self) -> Option<&AccumulatorField> {
        self.accumulator.as_ref()
    }

    /// Hook names in the order they run during decode.
    pub fn hook_names(&self) -> Vec<&'static str> {
        self.pipeline.hook_names()
    }

    pub(crate) fn structural(&self) -> &StructuralValidator {
        &self.structural
    }

    /// The draft-7 JSON schema validated records must satisfy.
    pub fn json_schema(&self) -> &Value {
        self.structural.schema()
    }

    /// Column names for writing: the declared field names, with the counter
    /// field replaced in place by one column per enum member.
    pub fn header_fieldnames(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            match &self.accumulator {
                Some(acc) if acc.name == field.name => {
                    names.extend(acc.key.members().iter().cloned());
                }
                _ => names.push(field.name.clone()),
            }
        }
        names
    }

    /// Decode one raw row into a validated record.
    pub fn decode(&self, row: Row) -> ValidationResult<Record> {
        self.pipeline.decode(self, row)
    }

    /// Encode a record back into a row.
    ///
    /// Fails if a counter member column would overwrite a declared field of
    /// the same name, or if `record` does not match this record type.
    pub fn encode(&self, record: &Record) -> ValidationResult<Row> {
        self.pipeline.encode(self, record)
    }

    /// Validate a programmatically built value (a JSON object keyed by field name).
    ///
    /// Runs the same pipeline as [`RecordType::decode`]. Non-string values
    /// (arrays for list fields, objects for the counter field) pass through
    /// the text codecs untouched.
    pub fn validate_value(&self, value: Value) -> ValidationResult<Record> {
        match value {
            Value::Object(row) => self.decode(row),
            other => Err(ValidationError::invalid_value(
                "<record>",
                format!("expected an object, got {other}"),
            )),
        }
    }

    /// Validate any serializable value shaped like this record type.
    pub fn validate_typed<T: Serialize>(&self, value: &T) -> ValidationResult<Record> {
        self.validate_value(serde_json::to_value(value)?)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`RecordType`].
pub struct RecordTypeBuilder {
    fields: Vec<FieldSchema>,
    list_delimiter: String,
    unknown_fields: UnknownFields,
    row_hooks: Vec<Box<dyn RowHook>>,
    field_hooks: Vec<Box<dyn FieldHook>>,
}

impl Default for RecordTypeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordTypeBuilder {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            list_delimiter: DEFAULT_LIST_DELIMITER.to_string(),
            unknown_fields: UnknownFields::default(),
            row_hooks: Vec::new(),
            field_hooks: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSchema::new(name, field_type));
        self
    }

    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        default: Value,
    ) -> Self {
        self.fields
            .push(FieldSchema::new(name, field_type).with_default(default));
        self
    }

    pub fn field_schema(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Delimiter for list fields. Must be a single character.
    pub fn list_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.list_delimiter = delimiter.into();
        self
    }

    pub fn unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Append a row-level hook. Runs after the built-in row hooks on decode.
    pub fn row_hook(mut self, hook: impl RowHook + 'static) -> Self {
        self.row_hooks.push(Box::new(hook));
        self
    }

    /// Append a field-level hook. Runs after the built-in field hooks on decode.
    pub fn field_hook(mut self, hook: impl FieldHook + 'static) -> Self {
        self.field_hooks.push(Box::new(hook));
        self
    }

    pub fn build(self) -> SchemaResult<RecordType> {
        let list_delimiter = single_char(&self.list_delimiter)?;

        let mut index = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        let accumulator = find_accumulator(&self.fields)?;

        let list_fields: HashSet<String> = self
            .fields
            .iter()
            .filter(|f| f.field_type.is_list())
            .map(|f| f.name.clone())
            .collect();

        let optional_element_list_fields: HashSet<String> = self
            .fields
            .iter()
            .filter(|f| f.field_type.has_optional_elements())
            .map(|f| f.name.clone())
            .collect();

        let structural = StructuralValidator::new(&self.fields, self.unknown_fields)?;

        let mut pipeline = Pipeline::standard();
        for hook in self.row_hooks {
            pipeline.push_row_hook(hook);
        }
        for hook in self.field_hooks {
            pipeline.push_field_hook(hook);
        }

        tracing::debug!(
            fields = self.fields.len(),
            list_fields = list_fields.len(),
            accumulator = accumulator.as_ref().map(|a| a.name.as_str()),
            "built record type"
        );

        Ok(RecordType {
            fields: self.fields,
            index,
            list_delimiter,
            unknown_fields: self.unknown_fields,
            list_fields,
            optional_element_list_fields,
            accumulator,
            pipeline,
            structural,
        })
    }
}

fn single_char(delimiter: &str) -> SchemaResult<char> {
    let mut chars = delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(SchemaError::MultiCharDelimiter(delimiter.to_string())),
    }
}

/// Locate and check the counter field, if any.
fn find_accumulator(fields: &[FieldSchema]) -> SchemaResult<Option<AccumulatorField>> {
    let counters: Vec<(usize, &FieldSchema)> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.field_type.is_accumulator())
        .collect();

    if counters.len() > 1 {
        // TODO: allow several counters once their enum tokens are checked to be disjoint.
        return Err(SchemaError::MultipleAccumulators(
            counters.iter().map(|(_, f)| f.name.clone()).collect(),
        ));
    }

    let Some(&(position, field)) = counters.first() else {
        return Ok(None);
    };

    if field.field_type.is_optional() {
        return Err(SchemaError::OptionalAccumulator(field.name.clone()));
    }

    match &field.field_type {
        FieldType::Accumulator(key) => match key.as_ref() {
            FieldType::Plain(ScalarType::Enum(enum_type)) => Ok(Some(AccumulatorField {
                name: field.name.clone(),
                position,
                key: enum_type.clone(),
            })),
            other => Err(SchemaError::AccumulatorKeyNotEnum {
                field: field.name.clone(),
                found: other.to_string(),
            }),
        },
        other => Err(SchemaError::AccumulatorKeyNotEnum {
            field: field.name.clone(),
            found: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind() -> EnumType {
        EnumType::new("Kind", ["foo", "bar", "baz"]).unwrap()
    }

    #[test]
    fn test_derived_sets() {
        let rt = RecordType::builder()
            .field("name", FieldType::str())
            .field("values", FieldType::list(FieldType::int()))
            .field("maybe", FieldType::optional(FieldType::list(FieldType::int())))
            .field("holes", FieldType::list(FieldType::optional(FieldType::int())))
            .build()
            .unwrap();

        assert_eq!(rt.list_fields(), ["values", "maybe", "holes"]);
        assert_eq!(rt.optional_element_list_fields(), ["holes"]);
        assert!(rt.is_list_field("maybe"));
        assert!(!rt.is_list_field("name"));
        assert!(rt.accumulator().is_none());
        assert_eq!(rt.list_delimiter(), ',');
    }

    #[test]
    fn test_multi_char_delimiter_rejected() {
        let err = RecordType::builder()
            .field("values", FieldType::list(FieldType::int()))
            .list_delimiter(";;")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::MultiCharDelimiter(d) if d == ";;"));

        let err = RecordType::builder().list_delimiter("").build().unwrap_err();
        assert!(matches!(err, SchemaError::MultiCharDelimiter(_)));
    }

    #[test]
    fn test_non_ascii_single_char_delimiter_allowed() {
        let rt = RecordType::builder().list_delimiter("¦").build().unwrap();
        assert_eq!(rt.list_delimiter(), '¦');
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = RecordType::builder()
            .field("name", FieldType::str())
            .field("name", FieldType::int())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField(n) if n == "name"));
    }

    #[test]
    fn test_two_counters_rejected() {
        let err = RecordType::builder()
            .field("first", FieldType::counter(kind()))
            .field("second", FieldType::counter(kind()))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::MultipleAccumulators(names) if names == ["first", "second"]));
    }

    #[test]
    fn test_optional_counter_rejected() {
        let err = RecordType::builder()
            .field("counts", FieldType::optional(FieldType::counter(kind())))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::OptionalAccumulator(n) if n == "counts"));
    }

    #[test]
    fn test_non_enum_counter_rejected() {
        let err = RecordType::builder()
            .field("counts", FieldType::accumulator(FieldType::int()))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::AccumulatorKeyNotEnum { ref field, .. } if field == "counts"));
        assert!(err.to_string().contains("int"));
    }

    #[test]
    fn test_header_fieldnames_expands_counter_in_place() {
        let rt = RecordType::builder()
            .field("name", FieldType::str())
            .field("counts", FieldType::counter(kind()))
            .field("note", FieldType::optional(FieldType::str()))
            .build()
            .unwrap();

        assert_eq!(rt.header_fieldnames(), ["name", "foo", "bar", "baz", "note"]);
        let acc = rt.accumulator().unwrap();
        assert_eq!(acc.name, "counts");
        assert_eq!(acc.position, 1);
    }

    #[test]
    fn test_header_fieldnames_without_counter() {
        let rt = RecordType::builder()
            .field("name", FieldType::str())
            .field("count", FieldType::int())
            .build()
            .unwrap();
        assert_eq!(rt.header_fieldnames(), ["name", "count"]);
    }

    #[test]
    fn test_validate_value_rejects_non_object() {
        let rt = RecordType::builder().field("name", FieldType::str()).build().unwrap();
        assert!(rt.validate_value(json!(["Nils"])).is_err());
    }

    #[test]
    fn test_hook_order() {
        let rt = RecordType::builder().build().unwrap();
        assert_eq!(
            rt.hook_names(),
            ["empty_field_normalizer", "accumulator_pivot", "delimited_list"]
        );
    }
}
