//! Return Response Service
//!
//! Stores descriptions of HTTP responses (status, reason phrase, body,
//! headers, cookies) in a key-value table and serves CRUD over them.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http (axum router + middleware)
//!                  │
//!                  ▼
//!              service (validate, map record ⇄ row)
//!                  │
//!                  ▼
//!              store (TableStore: DynamoDB or in-memory)
//!
//!     Cross-cutting: config, observability, secrets, lifecycle
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use return_response::config::validation::validate_config;
use return_response::config::{load_config, ConfigError, ServiceConfig};
use return_response::lifecycle::signals::spawn_signal_listener;
use return_response::lifecycle::{bootstrap, Shutdown};
use return_response::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "return-response")]
#[command(about = "CRUD service for stored HTTP response records", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "return-response starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = ?config.storage.backend,
        table = %config.storage.table_name,
        secrets_enabled = config.secrets.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = bootstrap(config).await?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let shutdown_rx = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
