//! Bindable values, filter sets and write sets.
//!
//! Callers hand the layer either a scalar or an already-structured JSON
//! value via the tagged [`SqlValue`] model; nothing inspects runtime
//! types at write time. Only values flow through bind parameters -
//! identifiers never do.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

/// A single bindable SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Structured data, bound as JSONB.
    Json(serde_json::Value),
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Bind `value` as the next positional parameter of `query`.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
        SqlValue::Timestamp(v) => query.bind(*v),
        SqlValue::Json(v) => query.bind(v.clone()),
    }
}

/// Ordered set of `column = value` equality predicates.
///
/// Insertion order is preserved so the rendered SQL is deterministic for
/// a given sequence of `eq` calls.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    entries: Vec<(String, SqlValue)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate. The column name is trusted text.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.entries.push((column.into(), value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, SqlValue)] {
        &self.entries
    }
}

/// Ordered `column -> value` pairs for a single row write.
///
/// Order is preserved so placeholder numbering in the generated INSERT is
/// stable.
#[derive(Debug, Clone, Default)]
pub struct ColumnValues {
    entries: Vec<(String, SqlValue)>,
}

impl ColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column value. The column name is trusted text.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.entries.push((column.into(), value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, SqlValue)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conversions_tag_values() {
        assert_eq!(SqlValue::from(7i32), SqlValue::Int(7));
        assert_eq!(SqlValue::from("acme"), SqlValue::Text("acme".into()));
        assert_eq!(SqlValue::from(true), SqlValue::Bool(true));
        assert_eq!(
            SqlValue::from(json!({"remote": true})),
            SqlValue::Json(json!({"remote": true}))
        );
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(3i64)), SqlValue::Int(3));
    }

    #[test]
    fn filters_preserve_insertion_order() {
        let filters = Filters::new().eq("company", "Acme").eq("active", true);
        let entries = filters.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "company");
        assert_eq!(entries[1].0, "active");
    }

    #[test]
    fn column_values_preserve_insertion_order() {
        let values = ColumnValues::new().set("url", "https://x").set("title", "Engineer");
        assert_eq!(values.entries()[0].0, "url");
        assert_eq!(values.entries()[1].0, "title");
    }
}
