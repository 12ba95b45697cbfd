//! # Tinct Server
//!
//! Serves the design settings of a site and keeps every connected session on
//! the same theme.
//!
//! The engine loads in the background after the listener is up, so early
//! requests see `loading: true` and the compiled-in defaults.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tinct_config::{BusConfig, ConfigLoad, ConfigLoader, StoreConfig};
use tinct_server::{create_app, infra::bootstrap::build_state};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "tinct-server")]
#[command(about = "Design settings service with live theme propagation")]
struct Cli {
    /// Path to a tinct.toml configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config.clone() {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = cli.env_file.clone() {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tinct_core=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "loaded configuration file");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    info!(
        store = %config.store.kind(),
        bus = %config.bus.kind(),
        store_timeout = ?config.engine.store_timeout,
        bus_capacity = config.engine.bus_capacity,
        "settings configuration in effect"
    );
    if let StoreConfig::File { path } = &config.store {
        info!(path = %path.display(), "settings file");
    }
    if let BusConfig::Postgres { channel } | BusConfig::Redis { channel, .. } = &config.bus {
        info!(channel = %channel, "change bus channel");
    }

    let state = build_state(&config)
        .await
        .context("failed to build settings engine")?;
    let engine = state.engine().clone();

    let init_engine = engine.clone();
    tokio::spawn(async move {
        init_engine.initialize().await;
    });

    let app = create_app(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Tinct server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    engine.shutdown().await;
    info!("Tinct server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
