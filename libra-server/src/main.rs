//! libra: read-only job listings API.

use std::net::SocketAddr;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use libra_core::config::Config;
use libra_server::db::DalCell;
use libra_server::http::{run_server, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "libra", version, about = "Read-only HTTP API over scraped job listings")]
struct Cli {
    /// Bind host, overriding LIBRA_HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overriding LIBRA_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Restrict CORS to localhost instead of allowing any origin
    #[arg(long)]
    strict_cors: bool,
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing().ok();
    let cli = Cli::parse();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(mode = %config.mode, db_host = %config.db.host, "configuration loaded");

    let host = cli.host.unwrap_or(config.http.host);
    let port = cli.port.unwrap_or(config.http.port);
    let bind_addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;

    let state = AppState::new(DalCell::new(config.db));
    let server_config = ServerConfig {
        bind_addr,
        cors_permissive: !cli.strict_cors,
    };

    run_server(state, server_config).await?;
    Ok(())
}
