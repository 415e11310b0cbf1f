//! Products service.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                  PRODUCTS SERVICE                    │
//!   GET /products    │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!   ─────────────────┼─▶│ request  │──▶│ validate │──▶│ store.fetch_all  │  │
//!                    │  │ span     │   └──────────┘   └────────┬─────────┘  │
//!                    │  └──────────┘                           │            │
//!                    │                        ┌────────────────┴─────────┐  │
//!                    │                        ▼                          ▼  │
//!                    │               ┌────────────────┐      ┌────────────┐ │
//!                    │               │ dependent.call │      │process_data│ │
//!                    │               │ (spawned task) │      │ (this task)│ │
//!                    │               └───────┬────────┘      └─────┬──────┘ │
//!                    │                       └──── oneshot ──▶ join ◀┘      │
//!   ◀────────────────┼────────────────────────────── JSON ──────┘           │
//!                    │                                                      │
//!                    │   spans ──▶ tracing-opentelemetry ──▶ OTLP collector │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use products_service::aggregation::ThreadRandom;
use products_service::config::load_config;
use products_service::lifecycle::{signals, startup, Shutdown};
use products_service::observability::{metrics, Telemetry};
use products_service::{AppState, HttpServer};

#[derive(Parser)]
#[command(name = "products-service")]
#[command(about = "Traced product aggregation service", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging is not up yet; a bad config is reported by the runtime.
    let config = load_config(cli.config.as_deref())?;

    let telemetry = Telemetry::init(&config.observability)?;

    tracing::info!(
        service_name = %config.observability.service_name,
        version = env!("CARGO_PKG_VERSION"),
        tracing_enabled = telemetry.tracing_enabled(),
        otlp_endpoint = %config.observability.otlp_endpoint,
        "products-service starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = startup::connect_store(&config.store).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize product store");
        e
    })?;

    let state = AppState::new(&config, store, Arc::new(ThreadRandom))?;

    let bind_address = config.listener.bind_address();
    let listener = TcpListener::bind(&bind_address).await.map_err(|e| {
        tracing::error!(address = %bind_address, error = %e, "Failed to bind listener");
        e
    })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let served = HttpServer::new(&config, state)
        .run(listener, shutdown.subscribe())
        .await;

    if let Err(e) = telemetry.shutdown().await {
        tracing::error!(error = %e, "Failed to shut down tracing pipeline");
        return Err(e.into());
    }

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}
