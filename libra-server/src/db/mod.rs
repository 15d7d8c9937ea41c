//! Generic data-access layer over PostgreSQL
//!
//! Design rules, enforced throughout:
//! - Statement planning is pure ([`query`]): SQL text plus an ordered
//!   parameter list, assembled fresh per call and never cached
//! - Table and column identifiers are interpolated as trusted text;
//!   values always travel through positional bind parameters. The two
//!   paths never mix.
//! - One borrowed connection per statement; [`DalTransaction`] scopes
//!   several statements onto a single connection
//! - Contract violations (empty delete filters, degenerate upserts,
//!   mismatched raw-fragment parameters) are rejected before any SQL
//!   reaches the database

pub mod dal;
pub mod error;
pub mod pool;
pub mod query;
pub mod record;
pub mod value;

pub use dal::{Dal, DalTransaction, FetchMode, FunctionResult};
pub use error::DbError;
pub use pool::{create_pool, DalCell};
pub use query::{SelectQuery, StatementPlan};
pub use record::Record;
pub use value::{ColumnValues, Filters, SqlValue};
