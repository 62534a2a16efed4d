//! Resource router server.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────┐
//!                      │                  RESOURCE ROUTER                   │
//!   Client Request     │  ┌─────────┐   ┌──────────────┐   ┌────────────┐  │
//!   ───────────────────┼─▶│  http   │──▶│  dispatcher  │──▶│  registry  │  │
//!                      │  │ server  │   │ (state mach.)│   │ root match │  │
//!                      │  └─────────┘   └──────┬───────┘   └─────┬──────┘  │
//!                      │                       │                 ▼         │
//!                      │                       │          ┌────────────┐   │
//!                      │                       │          │ negotiator │   │
//!                      │                       ▼          └────────────┘   │
//!   Client Response    │               ┌──────────────┐                    │
//!   ◀──────────────────┼───────────────│   handler    │                    │
//!                      │               └──────────────┘                    │
//!                      │  config · observability · lifecycle                │
//!                      └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use resource_router::config::watcher::ConfigWatcher;
use resource_router::config::{build_registry, load_config, RouterConfig};
use resource_router::lifecycle::signals::wait_for_signal;
use resource_router::observability::{logging, metrics};
use resource_router::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "resource-router")]
#[command(about = "HTTP router with JSR-311 style resource matching", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload services when the configuration file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("resource-router v{} starting", env!("CARGO_PKG_VERSION"));

    let registry = build_registry(&config.services)?;
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = registry.services().len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Registry updates from the config watcher
    let (registry_tx, registry_rx) = mpsc::unbounded_channel();
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, mut config_rx) = ConfigWatcher::new(path);
            tokio::spawn(async move {
                while let Some(config) = config_rx.recv().await {
                    match build_registry(&config.services) {
                        Ok(registry) => {
                            if registry_tx.send(registry).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::error!(error = %e, "Reloaded services rejected"),
                    }
                }
            });
            Some(watcher.run()?)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, registry);
    server.run(listener, registry_rx, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
