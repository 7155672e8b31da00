//! Row decoding into store cells.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row as _, TypeInfo};
use tablegate_runtime::{Row, StoreError, StoreValue};

type Cell = Result<StoreValue, StoreError>;

/// Decode every column of `row`, in result order.
///
/// A column whose type has no cell mapping fails the whole row rather than
/// being reported as NULL.
pub fn decode_row(row: &PgRow) -> Result<Row, StoreError> {
    row.columns()
        .iter()
        .map(|col| {
            let value = decode_cell(row, col.ordinal(), col.type_info().name())
                .map_err(|e| column_error(col.name(), e))?;
            Ok((col.name().to_string(), value))
        })
        .collect()
}

fn column_error(column: &str, err: StoreError) -> StoreError {
    StoreError::Query(format!("column '{column}': {err}"))
}

/// Error for a column type the decoder has no mapping for.
pub fn unsupported_type(type_name: &str) -> StoreError {
    StoreError::Query(format!(
        "unsupported column type {type_name}; select supported columns or cast it in a view"
    ))
}

fn scalar<'r, T>(row: &'r PgRow, idx: usize, wrap: impl Fn(T) -> StoreValue) -> Cell
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    match row.try_get::<Option<T>, _>(idx) {
        Ok(Some(v)) => Ok(wrap(v)),
        Ok(None) => Ok(StoreValue::Null),
        Err(e) => Err(StoreError::Query(format!("could not be decoded: {e}"))),
    }
}

fn list<'r, T>(row: &'r PgRow, idx: usize, wrap: impl Fn(T) -> StoreValue) -> Cell
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    Vec<Option<T>>: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    scalar::<Vec<Option<T>>>(row, idx, |items| {
        StoreValue::List(
            items
                .into_iter()
                .map(|item| item.map_or(StoreValue::Null, &wrap))
                .collect(),
        )
    })
}

fn decode_cell(row: &PgRow, idx: usize, type_name: &str) -> Cell {
    match type_name {
        "BOOL" => scalar(row, idx, StoreValue::Bool),
        "INT2" => scalar(row, idx, |v: i16| StoreValue::Int(v.into())),
        "INT4" => scalar(row, idx, |v: i32| StoreValue::Int(v.into())),
        "INT8" => scalar(row, idx, StoreValue::Int),
        "FLOAT4" => scalar(row, idx, |v: f32| StoreValue::Float(v.into())),
        "FLOAT8" => scalar(row, idx, StoreValue::Float),
        "NUMERIC" => scalar(row, idx, StoreValue::Numeric),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => scalar(row, idx, StoreValue::String),
        "BYTEA" => scalar(row, idx, StoreValue::Bytes),
        "TIMESTAMPTZ" => scalar(row, idx, |v: DateTime<Utc>| StoreValue::Timestamp(v)),
        "TIMESTAMP" => scalar(row, idx, |v: NaiveDateTime| StoreValue::DateTime(v)),
        "DATE" => scalar(row, idx, |v: NaiveDate| StoreValue::Date(v)),
        "TIME" => scalar(row, idx, |v: NaiveTime| StoreValue::Time(v)),
        "JSON" | "JSONB" => scalar(row, idx, |v: serde_json::Value| StoreValue::Json(v)),
        "UUID" => scalar(row, idx, |v: uuid::Uuid| StoreValue::String(v.to_string())),
        "BOOL[]" => list(row, idx, StoreValue::Bool),
        "INT2[]" => list(row, idx, |v: i16| StoreValue::Int(v.into())),
        "INT4[]" => list(row, idx, |v: i32| StoreValue::Int(v.into())),
        "INT8[]" => list(row, idx, StoreValue::Int),
        "FLOAT4[]" => list(row, idx, |v: f32| StoreValue::Float(v.into())),
        "FLOAT8[]" => list(row, idx, StoreValue::Float),
        "NUMERIC[]" => list(row, idx, |v: BigDecimal| StoreValue::Numeric(v)),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => list(row, idx, StoreValue::String),
        "BYTEA[]" => list(row, idx, StoreValue::Bytes),
        "TIMESTAMPTZ[]" => list(row, idx, |v: DateTime<Utc>| StoreValue::Timestamp(v)),
        "TIMESTAMP[]" => list(row, idx, |v: NaiveDateTime| StoreValue::DateTime(v)),
        "DATE[]" => list(row, idx, |v: NaiveDate| StoreValue::Date(v)),
        "TIME[]" => list(row, idx, |v: NaiveTime| StoreValue::Time(v)),
        "JSON[]" | "JSONB[]" => list(row, idx, |v: serde_json::Value| StoreValue::Json(v)),
        "UUID[]" => list(row, idx, |v: uuid::Uuid| StoreValue::String(v.to_string())),
        other => Err(unsupported_type(other)),
    }
}
