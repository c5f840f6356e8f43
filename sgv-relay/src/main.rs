//! # nightsync
//!
//! Daemon that relays glucose readings to a Nightscout site.
//!
//! Usage:
//! ```bash
//! nightsync --config nightsync.toml
//! nightsync --help
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use sgv_relay::config::{Config, DEFAULT_CONFIG_PATH};
use sgv_relay::http;
use sgv_relay::server::Relay;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Relay glucose readings to a Nightscout site.
#[derive(Parser, Debug)]
#[command(name = "nightsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    setup_logging(&config.logging.level);

    tracing::info!(
        "nightsync v{} relaying to {}",
        env!("CARGO_PKG_VERSION"),
        config.nightscout.url
    );

    let relay = Arc::new(Relay::from_config(config).context("Failed to build HTTP client")?);
    let scheduler = relay.start_scheduler();

    let shutdown = CancellationToken::new();
    let server = if relay.config().http.enabled {
        let bind_address = relay.config().http.bind_address.as_str();
        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("Failed to bind {}", bind_address))?;
        Some(tokio::spawn(http::serve(
            Arc::clone(&relay),
            listener,
            shutdown.clone(),
        )))
    } else {
        tracing::info!("HTTP endpoints disabled");
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");

    relay.stop_scheduler();
    shutdown.cancel();

    if let Some(task) = scheduler {
        task.await.context("Scheduler task panicked")?;
    }
    if let Some(task) = server {
        task.await.context("HTTP task panicked")??;
    }

    tracing::info!("nightsync stopped");
    Ok(())
}

fn setup_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
