//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, subscriber setup)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (spans exported over OTLP, context propagation)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → OpenTelemetry collector (OTLP/gRPC)
//! ```
//!
//! # Design Decisions
//! - One `tracing` span tree drives both logs and exported traces
//! - Request ID flows through all subsystems via `x-request-id`
//! - Span export can be switched off, logging cannot

pub mod logging;
pub mod metrics;
pub mod tracing;

use std::time::Duration;

use opentelemetry_sdk::trace::TracerProvider;

use crate::config::ObservabilityConfig;
use self::tracing::TelemetryError;

/// Handle on the installed telemetry pipeline.
pub struct Telemetry {
    provider: Option<TracerProvider>,
    shutdown_timeout: Duration,
}

impl Telemetry {
    /// Install propagation, the tracer provider (if enabled) and the subscriber.
    pub fn init(config: &ObservabilityConfig) -> Result<Self, TelemetryError> {
        self::tracing::install_propagator();

        let provider = if config.tracing_enabled {
            Some(self::tracing::init_provider(config)?)
        } else {
            None
        };
        let tracer = provider.as_ref().map(self::tracing::tracer);
        logging::init_subscriber(config, tracer)?;

        Ok(Self {
            provider,
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
        })
    }

    pub fn tracing_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Flush pending spans, bounded by the configured shutdown timeout.
    pub async fn shutdown(self) -> Result<(), TelemetryError> {
        match self.provider {
            Some(provider) => self::tracing::shutdown_provider(provider, self.shutdown_timeout).await,
            None => Ok(()),
        }
    }
}
