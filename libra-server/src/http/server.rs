//! Axum server setup: router assembly, CORS, request tracing, graceful
//! shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::{Dal, DalCell};
use crate::http::error::ApiError;
use crate::http::routes;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    /// Allow any origin (default: true; this is a public read-only API).
    /// Set to false to restrict CORS to localhost for development.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            cors_permissive: true,
        }
    }
}

/// Shared application state: the once-initialized DAL cell.
#[derive(Clone)]
pub struct AppState {
    cell: Arc<DalCell>,
}

impl AppState {
    pub fn new(cell: DalCell) -> Self {
        Self {
            cell: Arc::new(cell),
        }
    }

    /// The shared DAL, creating the pool on first use.
    pub async fn dal(&self) -> Result<&Dal, ApiError> {
        Ok(self.cell.get().await?)
    }

    async fn shutdown(&self) {
        self.cell.close().await;
    }
}

/// Run the HTTP server until a shutdown signal arrives, then close the
/// pool.
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let cors = if config.cors_permissive {
        tracing::info!("CORS: permissive, all origins allowed");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin([
                "http://localhost:3000".parse().unwrap(),
                "http://127.0.0.1:3000".parse().unwrap(),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .merge(routes::home::router())
        .merge(routes::health::router())
        .merge(routes::jobs::router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state.clone());

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

/// Server startup error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 5000);
        assert!(config.cors_permissive);
    }
}
