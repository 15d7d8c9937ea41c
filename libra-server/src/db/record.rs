//! Dynamic row decoding.
//!
//! The layer has no compile-time knowledge of the relations it is
//! pointed at, so results come back as [`Record`]s: column name to JSON
//! value. Decoding dispatches on the reported Postgres type name; an
//! unrecognized type is an error rather than a silently dropped column.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

use crate::db::error::DbError;

/// One result row: column name -> JSON-encoded value.
pub type Record = Map<String, Value>;

/// Decode every column of `row` into a [`Record`].
pub(crate) fn from_row(row: &PgRow) -> Result<Record, DbError> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, index, column.name(), column.type_info().name())?;
        record.insert(column.name().to_owned(), value);
    }
    Ok(record)
}

/// Decode the first column of `row` as a bare scalar.
pub(crate) fn scalar_from_row(row: &PgRow) -> Result<Value, DbError> {
    let column = row
        .columns()
        .first()
        .ok_or_else(|| DbError::Contract("function returned a row with no columns".into()))?;
    decode_column(row, 0, column.name(), column.type_info().name())
}

fn decode_column(row: &PgRow, index: usize, name: &str, ty: &str) -> Result<Value, DbError> {
    let value = match ty {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| float_value(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(float_value),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(index)?
            .map(|d| match d.to_f64().and_then(Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::String(d.to_string()),
            }),
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" | "CITEXT" => row
            .try_get::<Option<String>, _>(index)?
            .map(Value::String),
        "UUID" => row
            .try_get::<Option<Uuid>, _>(index)?
            .map(|u| Value::String(u.to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|d| Value::String(d.to_string())),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)?
            .map(|t| Value::String(t.to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|t| Value::String(t.and_utc().to_rfc3339())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|t| Value::String(t.to_rfc3339())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        "TEXT[]" | "VARCHAR[]" => row
            .try_get::<Option<Vec<String>>, _>(index)?
            .map(|v| Value::Array(v.into_iter().map(Value::String).collect())),
        "INT4[]" => row
            .try_get::<Option<Vec<i32>>, _>(index)?
            .map(|v| Value::Array(v.into_iter().map(Value::from).collect())),
        "INT8[]" => row
            .try_get::<Option<Vec<i64>>, _>(index)?
            .map(|v| Value::Array(v.into_iter().map(Value::from).collect())),
        "VOID" => Some(Value::Null),
        _ => {
            return Err(DbError::Decode {
                column: name.to_owned(),
                ty: ty.to_owned(),
            })
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

// NaN and infinity have no JSON representation; surface them as null.
fn float_value(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_value_maps_nan_to_null() {
        assert_eq!(float_value(f64::NAN), Value::Null);
        assert_eq!(float_value(1.5), Value::from(1.5));
    }
}
