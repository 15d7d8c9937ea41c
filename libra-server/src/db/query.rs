//! Statement planning: SQL text plus an ordered parameter list.
//!
//! Plans are assembled fresh per call and never cached. Placeholders are
//! strictly positional (`$1..$n`), assigned in the order values are
//! consumed: filter values in insertion order, then raw-fragment
//! parameters, then (for writes) record values in record order. The Nth
//! placeholder in the SQL text always corresponds to the Nth parameter.

use crate::db::error::DbError;
use crate::db::value::{ColumnValues, Filters, SqlValue};

/// A fully assembled statement: SQL text and its bind parameters.
#[derive(Debug, Clone)]
pub struct StatementPlan {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Builder for SELECT statements.
///
/// Clauses render in a fixed order regardless of the order builder
/// methods are called: equality filters, raw predicate, ORDER BY, LIMIT.
///
/// Table and column names, the raw predicate text and the order-by text
/// are interpolated into the SQL as-is; they must come from trusted
/// code, never from request input. Values are always bound.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    table: String,
    columns: Option<Vec<String>>,
    filters: Filters,
    raw_where: Option<String>,
    raw_params: Vec<SqlValue>,
    order_by: Option<String>,
    limit: Option<u64>,
}

impl SelectQuery {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Select an explicit column list instead of `*`.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| (*c).to_owned()).collect());
        self
    }

    /// Replace the equality filter set.
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Add a single equality filter.
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.filters = self.filters.eq(column, value);
        self
    }

    /// Attach a raw boolean predicate with its own parameter list.
    ///
    /// Placeholders in the fragment are numbered `$1..$n` relative to
    /// `params`; the planner shifts them past any filter placeholders at
    /// assembly time. The fragment must not contain literal `$<digit>`
    /// text that is not a placeholder.
    pub fn raw_where(mut self, fragment: impl Into<String>, params: Vec<SqlValue>) -> Self {
        self.raw_where = Some(fragment.into());
        self.raw_params = params;
        self
    }

    /// Raw ORDER BY text, e.g. `"date_posted DESC"`.
    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    /// Row limit, rendered as a literal integer.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn table_name(&self) -> &str {
        &self.table
    }

    /// Assemble the statement.
    ///
    /// Fails with [`DbError::Contract`] if the raw predicate's highest
    /// placeholder disagrees with its parameter count.
    pub(crate) fn plan(&self) -> Result<StatementPlan, DbError> {
        let columns = match &self.columns {
            Some(cols) if !cols.is_empty() => cols.join(", "),
            _ => "*".to_owned(),
        };
        let mut sql = format!("SELECT {} FROM {}", columns, self.table);
        let mut params: Vec<SqlValue> =
            Vec::with_capacity(self.filters.len() + self.raw_params.len());

        if !self.filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&equality_clauses(&self.filters).join(" AND "));
            params.extend(self.filters.entries().iter().map(|(_, v)| v.clone()));
        }

        if let Some(fragment) = &self.raw_where {
            let (shifted, highest) = shift_placeholders(fragment, params.len());
            if highest != self.raw_params.len() {
                return Err(DbError::Contract(format!(
                    "raw predicate on '{}' references {} placeholder(s) but {} parameter(s) were supplied",
                    self.table,
                    highest,
                    self.raw_params.len()
                )));
            }
            if self.filters.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&shifted);
            } else {
                sql.push_str(" AND (");
                sql.push_str(&shifted);
                sql.push(')');
            }
            params.extend(self.raw_params.iter().cloned());
        }

        if let Some(order) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.to_string());
        }

        Ok(StatementPlan { sql, params })
    }
}

/// Plan `INSERT .. ON CONFLICT (..) DO UPDATE SET .. RETURNING *`.
///
/// Every non-conflict column is overwritten from EXCLUDED on conflict.
/// An empty write set, or one that supplies only the conflict column
/// (which would render an empty SET list), is rejected.
pub(crate) fn upsert_plan(
    table: &str,
    values: &ColumnValues,
    conflict_column: &str,
) -> Result<StatementPlan, DbError> {
    if values.is_empty() {
        return Err(DbError::Contract(format!(
            "upsert into '{table}' requires at least one column"
        )));
    }
    let update_list: Vec<String> = values
        .entries()
        .iter()
        .map(|(column, _)| column.as_str())
        .filter(|column| *column != conflict_column)
        .map(|column| format!("{column} = EXCLUDED.{column}"))
        .collect();
    if update_list.is_empty() {
        return Err(DbError::Contract(format!(
            "upsert into '{table}' supplies only the conflict column '{conflict_column}'"
        )));
    }

    let column_list: Vec<&str> = values.entries().iter().map(|(c, _)| c.as_str()).collect();
    let placeholder_list: Vec<String> = (1..=values.len()).map(|i| format!("${i}")).collect();
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT ({conflict_column}) DO UPDATE SET {} RETURNING *",
        column_list.join(", "),
        placeholder_list.join(", "),
        update_list.join(", "),
    );

    Ok(StatementPlan {
        sql,
        params: values.entries().iter().map(|(_, v)| v.clone()).collect(),
    })
}

/// Plan `DELETE FROM .. WHERE .. RETURNING *`.
///
/// An empty filter set is rejected before any SQL is assembled; this
/// operation never supports table-wide deletes.
pub(crate) fn delete_plan(table: &str, filters: &Filters) -> Result<StatementPlan, DbError> {
    if filters.is_empty() {
        return Err(DbError::Contract(format!(
            "delete on '{table}' requires at least one filter"
        )));
    }
    let sql = format!(
        "DELETE FROM {table} WHERE {} RETURNING *",
        equality_clauses(filters).join(" AND "),
    );
    Ok(StatementPlan {
        sql,
        params: filters.entries().iter().map(|(_, v)| v.clone()).collect(),
    })
}

/// Plan `SELECT * FROM fn($1, ..)` for a stored-function call.
pub(crate) fn function_plan(function: &str, params: &[SqlValue]) -> StatementPlan {
    let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("${i}")).collect();
    StatementPlan {
        sql: format!("SELECT * FROM {}({})", function, placeholders.join(", ")),
        params: params.to_vec(),
    }
}

/// Render `column = $n` clauses for a filter set, numbered from `$1`.
fn equality_clauses(filters: &Filters) -> Vec<String> {
    filters
        .entries()
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ${}", column, i + 1))
        .collect()
}

/// Shift every `$n` placeholder in `fragment` up by `offset`, returning
/// the rewritten text and the highest placeholder index seen (before
/// shifting).
fn shift_placeholders(fragment: &str, offset: usize) -> (String, usize) {
    let mut out = String::with_capacity(fragment.len() + 4);
    let mut highest = 0usize;
    let mut chars = fragment.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek().is_some_and(|next| next.is_ascii_digit()) {
            let mut index = 0usize;
            while let Some(digit) = chars.peek().and_then(|next| next.to_digit(10)) {
                index = index * 10 + digit as usize;
                chars.next();
            }
            highest = highest.max(index);
            out.push('$');
            out.push_str(&(index + offset).to_string());
        } else {
            out.push(c);
        }
    }
    (out, highest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_select_renders_star() {
        let plan = SelectQuery::table("jobs").plan().unwrap();
        assert_eq!(plan.sql, "SELECT * FROM jobs");
        assert!(plan.params.is_empty());
    }

    #[test]
    fn explicit_columns_render_in_order() {
        let plan = SelectQuery::table("jobs")
            .columns(&["title", "company"])
            .plan()
            .unwrap();
        assert_eq!(plan.sql, "SELECT title, company FROM jobs");
    }

    #[test]
    fn filters_render_one_clause_per_entry_in_insertion_order() {
        let plan = SelectQuery::table("jobs")
            .filter("company", "Acme")
            .filter("remote", true)
            .filter("seniority", "senior")
            .plan()
            .unwrap();
        assert_eq!(
            plan.sql,
            "SELECT * FROM jobs WHERE company = $1 AND remote = $2 AND seniority = $3"
        );
        assert_eq!(
            plan.params,
            vec![
                SqlValue::Text("Acme".into()),
                SqlValue::Bool(true),
                SqlValue::Text("senior".into()),
            ]
        );
    }

    #[test]
    fn raw_where_alone_introduces_where() {
        let plan = SelectQuery::table("jobs")
            .raw_where("title ILIKE $1", vec!["%rust%".into()])
            .plan()
            .unwrap();
        assert_eq!(plan.sql, "SELECT * FROM jobs WHERE title ILIKE $1");
        assert_eq!(plan.params, vec![SqlValue::Text("%rust%".into())]);
    }

    #[test]
    fn raw_where_ands_onto_filters_with_shifted_placeholders() {
        let plan = SelectQuery::table("jobs")
            .filter("company", "Acme")
            .raw_where("title ILIKE $1 OR description ILIKE $1", vec!["%rust%".into()])
            .plan()
            .unwrap();
        assert_eq!(
            plan.sql,
            "SELECT * FROM jobs WHERE company = $1 AND (title ILIKE $2 OR description ILIKE $2)"
        );
        assert_eq!(plan.params.len(), 2);
    }

    #[test]
    fn raw_where_with_mismatched_params_is_rejected() {
        let err = SelectQuery::table("jobs")
            .raw_where("title ILIKE $1 AND company = $2", vec!["%rust%".into()])
            .plan()
            .unwrap_err();
        assert!(matches!(err, DbError::Contract(_)));

        let err = SelectQuery::table("jobs")
            .raw_where("remote IS NOT NULL", vec!["stray".into()])
            .plan()
            .unwrap_err();
        assert!(matches!(err, DbError::Contract(_)));
    }

    #[test]
    fn clause_order_is_fixed_regardless_of_call_order() {
        let plan = SelectQuery::table("jobs")
            .limit(10)
            .order_by("date_posted DESC")
            .raw_where("salary_min > $1", vec![100_000i64.into()])
            .filter("company", "Acme")
            .plan()
            .unwrap();
        assert_eq!(
            plan.sql,
            "SELECT * FROM jobs WHERE company = $1 AND (salary_min > $2) \
             ORDER BY date_posted DESC LIMIT 10"
        );
    }

    #[test]
    fn limit_is_literal_text() {
        let plan = SelectQuery::table("jobs").limit(25).plan().unwrap();
        assert_eq!(plan.sql, "SELECT * FROM jobs LIMIT 25");
        assert!(plan.params.is_empty());
    }

    #[test]
    fn multi_digit_placeholders_shift_correctly() {
        let (shifted, highest) = shift_placeholders("a = $1 AND b = $10", 3);
        assert_eq!(shifted, "a = $4 AND b = $13");
        assert_eq!(highest, 10);
    }

    #[test]
    fn dollar_without_digit_passes_through() {
        let (shifted, highest) = shift_placeholders("payload->>'cost' = '$'", 2);
        assert_eq!(shifted, "payload->>'cost' = '$'");
        assert_eq!(highest, 0);
    }

    #[test]
    fn upsert_shape_excludes_conflict_column_from_set_list() {
        let values = ColumnValues::new()
            .set("url", "https://jobs.acme.dev/1")
            .set("title", "Platform Engineer")
            .set("company", "Acme");
        let plan = upsert_plan("jobs", &values, "url").unwrap();
        assert_eq!(
            plan.sql,
            "INSERT INTO jobs (url, title, company) VALUES ($1, $2, $3) \
             ON CONFLICT (url) DO UPDATE SET title = EXCLUDED.title, company = EXCLUDED.company \
             RETURNING *"
        );
        assert_eq!(plan.params.len(), 3);
    }

    #[test]
    fn upsert_binds_structured_values_as_tagged_json() {
        let values = ColumnValues::new()
            .set("url", "https://jobs.acme.dev/2")
            .set("tags", json!(["rust", "backend"]));
        let plan = upsert_plan("jobs", &values, "url").unwrap();
        assert_eq!(plan.params[1], SqlValue::Json(json!(["rust", "backend"])));
    }

    #[test]
    fn upsert_with_only_conflict_column_is_rejected() {
        let values = ColumnValues::new().set("url", "https://jobs.acme.dev/3");
        let err = upsert_plan("jobs", &values, "url").unwrap_err();
        assert!(matches!(err, DbError::Contract(_)));
    }

    #[test]
    fn empty_upsert_is_rejected() {
        let err = upsert_plan("jobs", &ColumnValues::new(), "url").unwrap_err();
        assert!(matches!(err, DbError::Contract(_)));
    }

    #[test]
    fn delete_renders_anded_equalities_and_returning() {
        let filters = Filters::new().eq("company", "Acme").eq("stale", true);
        let plan = delete_plan("jobs", &filters).unwrap();
        assert_eq!(
            plan.sql,
            "DELETE FROM jobs WHERE company = $1 AND stale = $2 RETURNING *"
        );
        assert_eq!(plan.params.len(), 2);
    }

    #[test]
    fn delete_without_filters_is_rejected_before_assembly() {
        let err = delete_plan("jobs", &Filters::new()).unwrap_err();
        assert!(matches!(err, DbError::Contract(_)));
    }

    #[test]
    fn function_plan_numbers_placeholders() {
        let plan = function_plan("jobs_by_sponsor", &["H1B".into(), 5i64.into()]);
        assert_eq!(plan.sql, "SELECT * FROM jobs_by_sponsor($1, $2)");
        assert_eq!(plan.params.len(), 2);
    }

    #[test]
    fn function_plan_with_no_params_has_empty_call_list() {
        let plan = function_plan("jobs_by_sponsor", &[]);
        assert_eq!(plan.sql, "SELECT * FROM jobs_by_sponsor()");
        assert!(plan.params.is_empty());
    }
}
