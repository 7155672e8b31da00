//! Store result cells and their JSON rendering.
//!
//! Adapters decode rows into [`StoreValue`] cells; [`StoreValue::normalize`]
//! turns them into JSON the caller can consume. Decimals become decimal
//! strings, temporal values become ISO-8601 strings and bytes become base64,
//! recursively through lists and records.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use crate::store::Row;

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(BigDecimal),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Json(Value),
    List(Vec<StoreValue>),
    Record(Vec<(String, StoreValue)>),
}

impl StoreValue {
    pub fn normalize(&self) -> Value {
        match self {
            StoreValue::Null => Value::Null,
            StoreValue::Bool(b) => Value::Bool(*b),
            StoreValue::Int(i) => Value::from(*i),
            // NaN and infinities have no JSON form.
            StoreValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            StoreValue::Numeric(d) => Value::String(d.to_string()),
            StoreValue::String(s) => Value::String(s.clone()),
            StoreValue::Bytes(b) => Value::String(BASE64.encode(b)),
            StoreValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
            StoreValue::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            StoreValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            StoreValue::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
            StoreValue::Json(v) => v.clone(),
            StoreValue::List(items) => Value::Array(items.iter().map(Self::normalize).collect()),
            StoreValue::Record(fields) => Value::Object(normalize_row(fields)),
        }
    }
}

/// Render one row as a JSON object.
pub fn normalize_row(row: &Row) -> Map<String, Value> {
    row.iter()
        .map(|(column, value)| (column.clone(), value.normalize()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_scalars() {
        assert_eq!(StoreValue::Null.normalize(), Value::Null);
        assert_eq!(StoreValue::Bool(true).normalize(), json!(true));
        assert_eq!(StoreValue::Int(-4).normalize(), json!(-4));
        assert_eq!(StoreValue::Float(2.5).normalize(), json!(2.5));
        assert_eq!(StoreValue::Float(f64::NAN).normalize(), Value::Null);
        assert_eq!(StoreValue::String("x".into()).normalize(), json!("x"));
        assert_eq!(StoreValue::Bytes(b"hi".to_vec()).normalize(), json!("aGk="));
    }

    #[test]
    fn test_decimal_is_a_string() {
        let d = BigDecimal::from_str("19.90").unwrap();
        assert_eq!(StoreValue::Numeric(d).normalize(), json!("19.90"));
        let d = BigDecimal::from_str("1000").unwrap();
        assert_eq!(StoreValue::Numeric(d).normalize(), json!("1000"));
    }

    #[test]
    fn test_temporal_values_are_iso_strings() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap();
        assert_eq!(
            StoreValue::Timestamp(ts).normalize(),
            json!("2024-03-01T10:15:00+00:00")
        );

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(StoreValue::Date(date).normalize(), json!("2024-03-01"));

        let dt = date.and_hms_milli_opt(8, 30, 0, 250).unwrap();
        assert_eq!(StoreValue::DateTime(dt).normalize(), json!("2024-03-01T08:30:00.250"));

        let t = NaiveTime::from_hms_opt(23, 59, 1).unwrap();
        assert_eq!(StoreValue::Time(t).normalize(), json!("23:59:01"));
    }

    #[test]
    fn test_nested_values_are_normalized_recursively() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let value = StoreValue::Record(vec![
            (
                "prices".into(),
                StoreValue::List(vec![
                    StoreValue::Numeric(BigDecimal::from_str("1.50").unwrap()),
                    StoreValue::Null,
                ]),
            ),
            (
                "meta".into(),
                StoreValue::Record(vec![("day".into(), StoreValue::Date(date))]),
            ),
        ]);
        assert_eq!(
            value.normalize(),
            json!({"prices": ["1.50", null], "meta": {"day": "2024-01-02"}})
        );
    }

    #[test]
    fn test_row_keeps_column_order() {
        let row = vec![
            ("zone".to_string(), StoreValue::Int(1)),
            ("amount".to_string(), StoreValue::Int(2)),
            ("memo".to_string(), StoreValue::Null),
        ];
        let normalized = normalize_row(&row);
        let keys: Vec<&str> = normalized.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zone", "amount", "memo"]);
        assert_eq!(
            Value::Object(normalized).to_string(),
            r#"{"zone":1,"amount":2,"memo":null}"#
        );
    }
}
