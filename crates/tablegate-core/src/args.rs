//! Structured operation arguments.
//!
//! [`ExecuteArgs`] is built from the wire document once per request and is
//! validated during construction: every identifier is whitelisted, every
//! filter/set literal is typed, table fields are checked against the type
//! allow-list and operation-specific requirements are enforced. A value of
//! this type is therefore always safe to hand to the translator.

use crate::error::ValidationError;
use crate::ident::Identifier;
use crate::value::ParamValue;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Limit used when a SELECT does not specify one.
pub const DEFAULT_LIMIT: i64 = 100;

/// The five supported operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Select,
    CreateTable,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Select,
        Operation::CreateTable,
        Operation::Insert,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "SELECT",
            Operation::CreateTable => "CREATE_TABLE",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == upper)
            .ok_or_else(|| ValidationError::Malformed(format!("unknown operation '{s}'")))
    }
}

/// Column types accepted by CREATE_TABLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Bytes,
    Int64,
    Float64,
    Numeric,
    Bignumeric,
    Bool,
    Timestamp,
    Date,
    Time,
    Datetime,
    Json,
}

impl FieldType {
    pub const ALL: [FieldType; 12] = [
        FieldType::String,
        FieldType::Bytes,
        FieldType::Int64,
        FieldType::Float64,
        FieldType::Numeric,
        FieldType::Bignumeric,
        FieldType::Bool,
        FieldType::Timestamp,
        FieldType::Date,
        FieldType::Time,
        FieldType::Datetime,
        FieldType::Json,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Bytes => "BYTES",
            FieldType::Int64 => "INT64",
            FieldType::Float64 => "FLOAT64",
            FieldType::Numeric => "NUMERIC",
            FieldType::Bignumeric => "BIGNUMERIC",
            FieldType::Bool => "BOOL",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::Datetime => "DATETIME",
            FieldType::Json => "JSON",
        }
    }
}

impl FromStr for FieldType {
    type Err = ValidationError;

    /// Case-insensitive; the allow-list is the only accepted vocabulary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or(ValidationError::UnsupportedFieldType(upper))
    }
}

/// Column mode for CREATE_TABLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

impl FieldMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldMode::Nullable => "NULLABLE",
            FieldMode::Required => "REQUIRED",
            FieldMode::Repeated => "REPEATED",
        }
    }

    fn parse(field: &str, mode: &str) -> Result<Self, ValidationError> {
        match mode.trim().to_ascii_uppercase().as_str() {
            "NULLABLE" => Ok(FieldMode::Nullable),
            "REQUIRED" => Ok(FieldMode::Required),
            "REPEATED" => Ok(FieldMode::Repeated),
            _ => Err(ValidationError::InvalidFieldMode {
                field: field.to_string(),
                mode: mode.to_string(),
            }),
        }
    }
}

/// One column definition for CREATE_TABLE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableField {
    pub name: Identifier,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub mode: FieldMode,
}

impl TableField {
    pub fn new(name: Identifier, field_type: FieldType, mode: FieldMode) -> Self {
        Self {
            name,
            field_type,
            mode,
        }
    }
}

/// Wire shape of a table field, before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTableField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    mode: Option<String>,
}

impl TryFrom<RawTableField> for TableField {
    type Error = ValidationError;

    fn try_from(raw: RawTableField) -> Result<Self, Self::Error> {
        let field_type = FieldType::from_str(&raw.field_type)?;
        let name = Identifier::parse(raw.name, "field name")?;
        let mode = match raw.mode.as_deref() {
            Some(m) => FieldMode::parse(name.as_str(), m)?,
            None => FieldMode::default(),
        };
        Ok(Self::new(name, field_type, mode))
    }
}

/// Wire shape of the operation document, before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExecuteArgs {
    operation: Operation,
    dataset: String,
    table: String,
    #[serde(default)]
    columns: Option<Vec<String>>,
    #[serde(default)]
    filters: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "any_number")]
    limit: Option<i64>,
    #[serde(default)]
    schema: Option<Vec<RawTableField>>,
    #[serde(default)]
    if_not_exists: Option<bool>,
    #[serde(default)]
    rows: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    set_values: Option<Map<String, Value>>,
}

/// Accepts any JSON number as a limit. Fractions truncate toward zero and
/// values outside `i64` saturate; clamping happens later.
fn any_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(number.map(|n| match n.as_i64() {
        Some(v) => v,
        None if n.is_u64() => i64::MAX,
        None => n.as_f64().unwrap_or_default() as i64,
    }))
}

/// A validated operation request.
///
/// Empty optional collections are normalized to empty vectors: "no filters"
/// and "an empty filter map" mean the same thing everywhere downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteArgs {
    pub operation: Operation,
    pub dataset: Identifier,
    pub table: Identifier,
    /// Explicit projection; `None` selects all columns.
    pub columns: Option<Vec<Identifier>>,
    /// Equality filters in wire order.
    pub filters: Vec<(Identifier, ParamValue)>,
    /// Requested limit, not yet clamped.
    pub limit: i64,
    pub schema: Vec<TableField>,
    pub if_not_exists: bool,
    pub rows: Vec<Map<String, Value>>,
    pub set_values: Vec<(Identifier, ParamValue)>,
}

impl ExecuteArgs {
    /// Parse and validate an operation document.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let raw: RawExecuteArgs =
            serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    fn check_requirements(&self) -> Result<(), ValidationError> {
        match self.operation {
            Operation::Select | Operation::Delete => Ok(()),
            Operation::CreateTable if self.schema.is_empty() => Err(
                ValidationError::MissingRequirement("schema is required for CREATE_TABLE"),
            ),
            Operation::CreateTable => Ok(()),
            Operation::Insert if self.rows.is_empty() => Err(
                ValidationError::MissingRequirement("rows is required for INSERT"),
            ),
            Operation::Insert => Ok(()),
            Operation::Update if self.set_values.is_empty() => Err(
                ValidationError::MissingRequirement("set_values is required for UPDATE"),
            ),
            Operation::Update if self.filters.is_empty() => Err(
                ValidationError::MissingRequirement("filters are required for UPDATE (safe default)"),
            ),
            Operation::Update => Ok(()),
        }
    }
}

fn typed_pairs(
    map: Option<Map<String, Value>>,
    label: &str,
) -> Result<Vec<(Identifier, ParamValue)>, ValidationError> {
    map.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let literal = ParamValue::from_json(&key, &value)?;
            Ok((Identifier::parse(key, label)?, literal))
        })
        .collect()
}

impl TryFrom<RawExecuteArgs> for ExecuteArgs {
    type Error = ValidationError;

    fn try_from(raw: RawExecuteArgs) -> Result<Self, Self::Error> {
        let dataset = Identifier::parse(raw.dataset, "dataset")?;
        let table = Identifier::parse(raw.table, "table")?;

        let columns = match raw.columns {
            Some(cols) if !cols.is_empty() => Some(
                cols.into_iter()
                    .map(|c| Identifier::parse(c, "column"))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            _ => None,
        };

        let filters = typed_pairs(raw.filters, "column")?;
        let set_values = typed_pairs(raw.set_values, "column")?;

        let schema = raw
            .schema
            .unwrap_or_default()
            .into_iter()
            .map(TableField::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let args = Self {
            operation: raw.operation,
            dataset,
            table,
            columns,
            filters,
            limit: raw.limit.unwrap_or(DEFAULT_LIMIT),
            schema,
            if_not_exists: raw.if_not_exists.unwrap_or(true),
            rows: raw.rows.unwrap_or_default(),
            set_values,
        };
        args.check_requirements()?;
        Ok(args)
    }
}
