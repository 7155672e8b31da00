//! Typed literal values for bound query parameters.
//!
//! Filter and set values arrive as JSON. Each one is converted into a
//! [`ParamValue`] whose variant carries the kind explicitly; the store type is
//! then read off the variant by [`ParamValue::param_type`].
//!
//! JSON has no decimal, date or timestamp kinds, so those are requested with a
//! single-key tagged object:
//!
//! ```json
//! { "price": { "$numeric": "19.90" }, "day": { "$date": "2024-03-01" } }
//! ```

use crate::error::ValidationError;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

const NUMERIC_TAG: &str = "$numeric";
const DATE_TAG: &str = "$date";
const TIMESTAMP_TAG: &str = "$timestamp";

/// Store-side type of a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamType {
    Bool,
    Int64,
    Float64,
    Numeric,
    Timestamp,
    Date,
    String,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Bool => "BOOL",
            ParamType::Int64 => "INT64",
            ParamType::Float64 => "FLOAT64",
            ParamType::Numeric => "NUMERIC",
            ParamType::Timestamp => "TIMESTAMP",
            ParamType::Date => "DATE",
            ParamType::String => "STRING",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal bound as a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Numeric(BigDecimal),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    String(String),
    /// JSON `null`; bound as a STRING-typed NULL.
    Null,
}

impl ParamValue {
    /// Store type for this value.
    ///
    /// Precedence is bool, integer, float, decimal, timestamp, date, then
    /// string for everything else.
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Bool(_) => ParamType::Bool,
            ParamValue::Int64(_) => ParamType::Int64,
            ParamValue::Float64(_) => ParamType::Float64,
            ParamValue::Numeric(_) => ParamType::Numeric,
            ParamValue::Timestamp(_) => ParamType::Timestamp,
            ParamValue::Date(_) => ParamType::Date,
            ParamValue::String(_) | ParamValue::Null => ParamType::String,
        }
    }

    /// Convert a JSON literal supplied for `key` into a typed value.
    ///
    /// Booleans are matched before numbers. Integers outside the signed 64-bit
    /// range become NUMERIC. Arrays and untagged objects fall through to
    /// STRING carrying their JSON text.
    pub fn from_json(key: &str, value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ParamValue::Int64(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(ParamValue::Numeric(BigDecimal::from(u)))
                } else {
                    n.as_f64().map(ParamValue::Float64).ok_or_else(|| {
                        ValidationError::InvalidLiteral {
                            key: key.to_string(),
                            kind: "FLOAT64",
                            reason: format!("{n} is not representable"),
                        }
                    })
                }
            }
            Value::Object(map) if map.len() == 1 => {
                let Some((tag, inner)) = map.iter().next() else {
                    return Ok(ParamValue::String(value.to_string()));
                };
                match tag.as_str() {
                    NUMERIC_TAG => parse_numeric(key, inner),
                    DATE_TAG => parse_date(key, inner),
                    TIMESTAMP_TAG => parse_timestamp(key, inner),
                    _ => Ok(ParamValue::String(value.to_string())),
                }
            }
            Value::String(s) => Ok(ParamValue::String(s.clone())),
            Value::Null => Ok(ParamValue::Null),
            other => Ok(ParamValue::String(other.to_string())),
        }
    }
}

fn tagged_str<'a>(key: &str, kind: &'static str, inner: &'a Value) -> Result<&'a str, ValidationError> {
    inner.as_str().ok_or_else(|| ValidationError::InvalidLiteral {
        key: key.to_string(),
        kind,
        reason: format!("expected a string, got {inner}"),
    })
}

fn parse_numeric(key: &str, inner: &Value) -> Result<ParamValue, ValidationError> {
    let text = match inner {
        Value::Number(n) => n.to_string(),
        other => tagged_str(key, "NUMERIC", other)?.to_string(),
    };
    BigDecimal::from_str(text.trim())
        .map(ParamValue::Numeric)
        .map_err(|e| ValidationError::InvalidLiteral {
            key: key.to_string(),
            kind: "NUMERIC",
            reason: e.to_string(),
        })
}

fn parse_date(key: &str, inner: &Value) -> Result<ParamValue, ValidationError> {
    let text = tagged_str(key, "DATE", inner)?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(ParamValue::Date)
        .map_err(|e| ValidationError::InvalidLiteral {
            key: key.to_string(),
            kind: "DATE",
            reason: e.to_string(),
        })
}

fn parse_timestamp(key: &str, inner: &Value) -> Result<ParamValue, ValidationError> {
    let text = tagged_str(key, "TIMESTAMP", inner)?;
    DateTime::parse_from_rfc3339(text)
        .map(|dt| ParamValue::Timestamp(dt.with_timezone(&Utc)))
        .map_err(|e| ValidationError::InvalidLiteral {
            key: key.to_string(),
            kind: "TIMESTAMP",
            reason: e.to_string(),
        })
}
