//! HTTP surface over the data-access layer.
//!
//! Handlers map URL path and query parameters onto DAL calls and
//! translate [`crate::db::DbError`] into JSON error responses. All
//! endpoints are read-only; writes happen in the scrapers that feed the
//! store.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{run_server, AppState, ServerConfig};
