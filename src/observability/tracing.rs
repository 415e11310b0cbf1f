//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OpenTelemetry tracer provider (OTLP/gRPC, batched export)
//! - Install W3C Trace Context + Baggage propagation
//! - Extract trace context from incoming requests, inject it into outgoing ones
//! - Record stage errors on spans
//! - Flush the span pipeline on shutdown within a deadline
//!
//! # Design Decisions
//! - Spans are plain `tracing` spans; `tracing-opentelemetry` turns them into
//!   OTel spans, so stages never touch the OTel API directly
//! - Provider shutdown blocks, so it runs on the blocking pool under a timeout

use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{
    Extractor, Injector, TextMapCompositePropagator, TextMapPropagator,
};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::ObservabilityConfig;

/// Name of the instrumentation scope used for every span of this service.
pub const TRACER_NAME: &str = "products-service";

/// Errors raised while setting up or tearing down telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to create trace exporter: {0}")]
    Exporter(String),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),

    #[error("failed to shut down tracer provider: {0}")]
    Shutdown(String),

    #[error("tracer provider shutdown exceeded {0:?}")]
    ShutdownTimeout(Duration),
}

/// Install the global text map propagator (W3C Trace Context + Baggage).
pub fn install_propagator() {
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));
}

/// Collector endpoints are often given as bare `host:port`; tonic needs a scheme.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

fn resource(config: &ObservabilityConfig) -> Resource {
    Resource::default().merge(&Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ]))
}

/// Build the tracer provider exporting to the configured OTLP collector.
///
/// The gRPC channel connects lazily; only exporter construction errors
/// surface here.
pub fn init_provider(config: &ObservabilityConfig) -> Result<TracerProvider, TelemetryError> {
    let endpoint = normalize_endpoint(&config.otlp_endpoint);
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let provider = TracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource(config))
        .with_batch_exporter(exporter, runtime::Tokio)
        .build();

    global::set_tracer_provider(provider.clone());

    tracing::debug!(endpoint = %endpoint, "OTLP span exporter configured");
    Ok(provider)
}

/// Tracer handed to the `tracing-opentelemetry` layer.
pub fn tracer(provider: &TracerProvider) -> Tracer {
    provider.tracer(TRACER_NAME)
}

/// Flush and shut down the provider, giving up after `timeout`.
pub async fn shutdown_provider(
    provider: TracerProvider,
    timeout: Duration,
) -> Result<(), TelemetryError> {
    let flush = tokio::task::spawn_blocking(move || provider.shutdown());

    match tokio::time::timeout(timeout, flush).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => Err(TelemetryError::Shutdown(e.to_string())),
        Ok(Err(join)) => Err(TelemetryError::Shutdown(join.to_string())),
        Err(_) => Err(TelemetryError::ShutdownTimeout(timeout)),
    }
}

/// Mark `span` as failed with `error`.
///
/// The span must have been created with `error`, `otel.status_code` and
/// `otel.status_message` declared as empty fields.
pub fn record_error(span: &Span, error: &dyn std::error::Error) {
    span.record("error", tracing::field::display(error));
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_message", tracing::field::display(error));
}

/// Reads propagation headers from an HTTP header map.
pub struct HeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Writes propagation headers into an HTTP header map.
pub struct HeaderInjector<'a>(pub &'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

/// Remote parent carried by the request headers, if any.
pub fn extract_context(headers: &HeaderMap) -> Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(headers)))
}

/// Propagation headers for a call made on behalf of `span`.
pub fn inject_span(span: &Span) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let cx = span.context();
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&cx, &mut HeaderInjector(&mut headers))
    });
    headers
}
