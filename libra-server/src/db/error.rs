//! Data-access error taxonomy.

use thiserror::Error;

/// Errors surfaced by the data-access layer.
///
/// Nothing is retried internally and nothing is swallowed: constraint
/// failures carry their table context and are re-raised after logging,
/// contract violations are rejected before any SQL is assembled.
#[derive(Debug, Error)]
pub enum DbError {
    /// Pool creation or connection borrow failed.
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// Unique, foreign-key or check violation, surfaced verbatim from
    /// the store.
    #[error("constraint violation on {table}: {source}")]
    Constraint {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    /// The caller broke the layer's contract; no SQL was executed.
    #[error("contract violation: {0}")]
    Contract(String),

    /// A result column could not be decoded into a JSON value.
    #[error("cannot decode column '{column}' of type {ty}")]
    Decode { column: String, ty: String },

    /// Any other statement or driver failure.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Sort a raw sqlx error into the taxonomy, attaching table context.
pub(crate) fn classify(table: &str, err: sqlx::Error) -> DbError {
    let is_constraint = matches!(
        &err,
        sqlx::Error::Database(db)
            if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation()
    );
    if is_constraint {
        return DbError::Constraint {
            table: table.to_owned(),
            source: err,
        };
    }
    match err {
        e @ (sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed) => DbError::Connection(e),
        e => DbError::Sqlx(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_errors_name_the_violation() {
        let err = DbError::Contract("delete on 'jobs' requires at least one filter".into());
        assert!(err.to_string().contains("delete on 'jobs'"));
    }

    #[test]
    fn pool_exhaustion_classifies_as_connection() {
        let err = classify("jobs", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[test]
    fn row_not_found_stays_generic() {
        let err = classify("jobs", sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Sqlx(_)));
    }
}
