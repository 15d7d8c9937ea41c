//! libra-server: read-only HTTP API over scraped job listings
//!
//! The interesting part lives in [`db`]: a generic data-access layer that
//! turns structured requests (select with filters, upsert on conflict,
//! delete with filters, stored-function calls) into parameterized SQL
//! executed over a shared connection pool. The [`http`] module is a thin
//! axum surface that maps request parameters onto DAL calls.

pub mod db;
pub mod http;

pub use db::{Dal, DalCell, DbError};
pub use http::{run_server, ApiError, AppState, ServerConfig};
