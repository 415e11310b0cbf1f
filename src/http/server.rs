//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, metrics)
//! - Serve on a bound listener until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::aggregation::{Aggregator, FaultInjector, RandomSource, SlowApi};
use crate::config::AppConfig;
use crate::demo::DemoPipeline;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id, record_response, set_request_id};
use crate::observability::metrics;
use crate::store::StoreClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub slow_api: Arc<SlowApi>,
    pub demo: Arc<DemoPipeline>,
}

impl AppState {
    /// Assemble every component from config around an injected store and random source.
    pub fn new(
        config: &AppConfig,
        store: StoreClient,
        source: Arc<dyn RandomSource>,
    ) -> Result<Self, reqwest::Error> {
        let slow_api = Arc::new(SlowApi::new(Duration::from_millis(config.stages.dependent_delay_ms)));
        let aggregator = Aggregator::from_config(&config.stages, store, slow_api.clone(), source.clone());

        let mut client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs));
        if !config.demo.use_system_proxy {
            client = client.no_proxy();
        }
        let client = client.build()?;
        let demo = DemoPipeline::new(
            client,
            &config.demo,
            FaultInjector::new(config.demo.database_failure_rate, source),
        );

        Ok(Self {
            aggregator: Arc::new(aggregator),
            slow_api,
            demo: Arc::new(demo),
        })
    }
}

/// HTTP server for the products service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &AppConfig, state: AppState) -> Self {
        Self {
            router: build_router(config, state),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// Traced routes are registered before the trace layer; `/health` after it.
#[allow(deprecated)]
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api", get(handlers::slow_api))
        .route("/products", get(handlers::get_products))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span)
                .on_response(record_response),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id())
        .layer(set_request_id())
}
