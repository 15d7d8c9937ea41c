//! Pool construction and once-only initialization.
//!
//! The pool is an explicitly owned resource: `main` builds a [`DalCell`]
//! and hands it to the HTTP layer through application state. The
//! underlying pool is created on first use, exactly once even under
//! concurrent first access, and torn down at process shutdown.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tokio::sync::OnceCell;

use libra_core::config::{DbConfig, TlsMode};

use crate::db::dal::Dal;
use crate::db::error::DbError;

/// Pool bounds: a small steady floor with bounded burst headroom.
const MIN_CONNECTIONS: u32 = 2;
const MAX_CONNECTIONS: u32 = 10;

fn connect_options(config: &DbConfig) -> PgConnectOptions {
    let ssl_mode = match config.tls {
        TlsMode::Disable => PgSslMode::Disable,
        // Encrypted transport, certificate and hostname unchecked.
        TlsMode::NoVerify => PgSslMode::Require,
        TlsMode::VerifyFull => PgSslMode::VerifyFull,
    };
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(&config.password)
        .ssl_mode(ssl_mode)
}

/// Create the connection pool, verifying connectivity up front.
///
/// An unreachable database is a fatal error for the caller; this layer
/// does not retry.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool, DbError> {
    PgPoolOptions::new()
        .min_connections(MIN_CONNECTIONS)
        .max_connections(MAX_CONNECTIONS)
        .connect_with(connect_options(config))
        .await
        .map_err(DbError::Connection)
}

/// Pool handle that defers connecting until first use. For contexts
/// where a live database cannot be assumed (tests).
#[cfg(test)]
pub(crate) fn lazy_pool(config: &DbConfig) -> PgPool {
    PgPoolOptions::new()
        .min_connections(MIN_CONNECTIONS)
        .max_connections(MAX_CONNECTIONS)
        .connect_lazy_with(connect_options(config))
}

/// Once-only holder for the shared [`Dal`].
///
/// Concurrent first callers race `get`; exactly one runs the pool
/// factory and everyone converges on its result. A creation failure
/// surfaces to the caller that triggered it and leaves the cell empty,
/// so the next caller makes its own attempt - there is no internal
/// retry loop.
pub struct DalCell {
    config: DbConfig,
    cell: OnceCell<Dal>,
}

impl DalCell {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// The shared DAL handle, creating the pool on first call.
    pub async fn get(&self) -> Result<&Dal, DbError> {
        self.get_with(|| async { Ok(Dal::new(create_pool(&self.config).await?)) })
            .await
    }

    async fn get_with<F, Fut>(&self, init: F) -> Result<&Dal, DbError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Dal, DbError>>,
    {
        self.cell.get_or_try_init(init).await
    }

    /// Close the pool if it was ever created. Called at shutdown.
    pub async fn close(&self) {
        if let Some(dal) = self.cell.get() {
            dal.close().await;
        }
    }
}
