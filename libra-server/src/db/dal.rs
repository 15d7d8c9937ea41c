//! The data-access layer proper: five operations plus a transaction
//! scope.
//!
//! Every operation borrows a connection from the pool for the duration
//! of one statement and releases it before returning. Statements issued
//! through a [`DalTransaction`] share a single borrowed connection and
//! commit or roll back together.

use serde_json::Value;
use sqlx::postgres::{PgExecutor, PgRow};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::error;

use libra_core::config::DbConfig;

use crate::db::error::{classify, DbError};
use crate::db::pool::create_pool;
use crate::db::query::{self, SelectQuery, StatementPlan};
use crate::db::record::{self, Record};
use crate::db::value::{bind_value, ColumnValues, Filters, SqlValue};

/// How a stored-function result is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// All rows.
    Fetch,
    /// A single scalar from the first row, null if no rows.
    FetchVal,
    /// The first row, if any.
    FetchRow,
}

/// Result of a stored-function call, shaped by [`FetchMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionResult {
    Rows(Vec<Record>),
    Scalar(Value),
    Row(Option<Record>),
}

impl FunctionResult {
    /// The row set, when called with [`FetchMode::Fetch`].
    pub fn into_rows(self) -> Option<Vec<Record>> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// The scalar, when called with [`FetchMode::FetchVal`].
    pub fn into_scalar(self) -> Option<Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// The optional row, when called with [`FetchMode::FetchRow`].
    pub fn into_row(self) -> Option<Option<Record>> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }
}

/// Handle over the shared connection pool.
///
/// Cloning is cheap; the pool is reference-counted internally.
#[derive(Clone, Debug)]
pub struct Dal {
    pool: PgPool,
}

impl Dal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and wrap a fresh pool.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        Ok(Self::new(create_pool(config).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Select records with optional filtering, ordering and limit.
    ///
    /// Returns every matching row, possibly none.
    pub async fn select(&self, query: SelectQuery) -> Result<Vec<Record>, DbError> {
        select_with(&self.pool, &query).await
    }

    /// Select a single record, `None` when nothing matches.
    pub async fn select_one(&self, query: SelectQuery) -> Result<Option<Record>, DbError> {
        select_one_with(&self.pool, query).await
    }

    /// Insert or update one row keyed on `conflict_column`, returning
    /// the written row.
    pub async fn upsert(
        &self,
        table: &str,
        values: ColumnValues,
        conflict_column: &str,
    ) -> Result<Record, DbError> {
        upsert_with(&self.pool, table, &values, conflict_column).await
    }

    /// Delete the rows matching `filters`, returning them.
    ///
    /// Filters are mandatory; unconditional table-wide deletes are not
    /// expressible through this layer.
    pub async fn delete(&self, table: &str, filters: Filters) -> Result<Vec<Record>, DbError> {
        delete_with(&self.pool, table, &filters).await
    }

    /// Invoke a stored function, shaping the result per `mode`.
    pub async fn call_function(
        &self,
        function: &str,
        params: Vec<SqlValue>,
        mode: FetchMode,
    ) -> Result<FunctionResult, DbError> {
        call_function_with(&self.pool, function, &params, mode).await
    }

    /// Open a transaction scope on one borrowed connection.
    pub async fn begin(&self) -> Result<DalTransaction<'static>, DbError> {
        let tx = self.pool.begin().await.map_err(DbError::Connection)?;
        Ok(DalTransaction { tx })
    }

    /// Close the pool. Called at process shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// A transaction scope over one borrowed connection.
///
/// Commit is explicit; dropping the scope without committing rolls the
/// transaction back, covering error paths and early returns alike. The
/// connection goes back to the pool either way.
pub struct DalTransaction<'c> {
    tx: Transaction<'c, Postgres>,
}

impl DalTransaction<'_> {
    pub async fn select(&mut self, query: SelectQuery) -> Result<Vec<Record>, DbError> {
        select_with(&mut *self.tx, &query).await
    }

    pub async fn select_one(&mut self, query: SelectQuery) -> Result<Option<Record>, DbError> {
        select_one_with(&mut *self.tx, query).await
    }

    pub async fn upsert(
        &mut self,
        table: &str,
        values: ColumnValues,
        conflict_column: &str,
    ) -> Result<Record, DbError> {
        upsert_with(&mut *self.tx, table, &values, conflict_column).await
    }

    pub async fn delete(&mut self, table: &str, filters: Filters) -> Result<Vec<Record>, DbError> {
        delete_with(&mut *self.tx, table, &filters).await
    }

    pub async fn call_function(
        &mut self,
        function: &str,
        params: Vec<SqlValue>,
        mode: FetchMode,
    ) -> Result<FunctionResult, DbError> {
        call_function_with(&mut *self.tx, function, &params, mode).await
    }

    pub async fn commit(self) -> Result<(), DbError> {
        self.tx.commit().await.map_err(DbError::from)
    }

    pub async fn rollback(self) -> Result<(), DbError> {
        self.tx.rollback().await.map_err(DbError::from)
    }
}

async fn select_with<'c, E>(executor: E, query: &SelectQuery) -> Result<Vec<Record>, DbError>
where
    E: PgExecutor<'c>,
{
    let plan = query.plan()?;
    let rows = fetch_all(executor, &plan)
        .await
        .map_err(|e| classify(query.table_name(), e))?;
    rows.iter().map(record::from_row).collect()
}

async fn select_one_with<'c, E>(executor: E, query: SelectQuery) -> Result<Option<Record>, DbError>
where
    E: PgExecutor<'c>,
{
    let mut rows = select_with(executor, &query.limit(1)).await?;
    Ok(if rows.is_empty() {
        None
    } else {
        Some(rows.swap_remove(0))
    })
}

async fn upsert_with<'c, E>(
    executor: E,
    table: &str,
    values: &ColumnValues,
    conflict_column: &str,
) -> Result<Record, DbError>
where
    E: PgExecutor<'c>,
{
    let plan = query::upsert_plan(table, values, conflict_column)?;
    match fetch_one(executor, &plan).await {
        Ok(row) => record::from_row(&row),
        Err(e) => {
            let e = classify(table, e);
            error!(table, error = %e, "upsert failed");
            Err(e)
        }
    }
}

async fn delete_with<'c, E>(executor: E, table: &str, filters: &Filters) -> Result<Vec<Record>, DbError>
where
    E: PgExecutor<'c>,
{
    let plan = query::delete_plan(table, filters)?;
    let rows = fetch_all(executor, &plan)
        .await
        .map_err(|e| classify(table, e))?;
    rows.iter().map(record::from_row).collect()
}

async fn call_function_with<'c, E>(
    executor: E,
    function: &str,
    params: &[SqlValue],
    mode: FetchMode,
) -> Result<FunctionResult, DbError>
where
    E: PgExecutor<'c>,
{
    let plan = query::function_plan(function, params);
    match mode {
        FetchMode::Fetch => {
            let rows = fetch_all(executor, &plan)
                .await
                .map_err(|e| classify(function, e))?;
            let records: Result<Vec<Record>, DbError> =
                rows.iter().map(record::from_row).collect();
            Ok(FunctionResult::Rows(records?))
        }
        FetchMode::FetchRow => {
            let row = fetch_optional(executor, &plan)
                .await
                .map_err(|e| classify(function, e))?;
            Ok(FunctionResult::Row(match &row {
                Some(row) => Some(record::from_row(row)?),
                None => None,
            }))
        }
        FetchMode::FetchVal => {
            let row = fetch_optional(executor, &plan)
                .await
                .map_err(|e| classify(function, e))?;
            Ok(FunctionResult::Scalar(match &row {
                Some(row) => record::scalar_from_row(row)?,
                None => Value::Null,
            }))
        }
    }
}

async fn fetch_all<'c, E>(executor: E, plan: &StatementPlan) -> Result<Vec<PgRow>, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    bound_query(plan).fetch_all(executor).await
}

async fn fetch_one<'c, E>(executor: E, plan: &StatementPlan) -> Result<PgRow, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    bound_query(plan).fetch_one(executor).await
}

async fn fetch_optional<'c, E>(
    executor: E,
    plan: &StatementPlan,
) -> Result<Option<PgRow>, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    bound_query(plan).fetch_optional(executor).await
}

fn bound_query<'q>(
    plan: &'q StatementPlan,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    let mut query = sqlx::query(&plan.sql);
    for value in &plan.params {
        query = bind_value(query, value);
    }
    query
}
