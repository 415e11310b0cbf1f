//! External-dependency demo served on `/`.
//!
//! # Responsibilities
//! - Simulate a traced database query with injected errors
//! - Call an external HTTP API, propagating the trace context in headers
//!
//! # Design Decisions
//! - Store-free: nothing here touches the product store
//! - Outbound headers carry `traceparent` so the remote side joins the trace

use std::time::Duration;

use thiserror::Error;
use tracing::{field, Instrument, Span};

use crate::aggregation::FaultInjector;
use crate::config::DemoConfig;
use crate::observability::tracing::{inject_span, record_error};

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("External API error: {0}")]
    External(String),
}

/// Database simulation followed by an external API call.
#[derive(Debug, Clone)]
pub struct DemoPipeline {
    client: reqwest::Client,
    database_delay: Duration,
    database_faults: FaultInjector,
    external_url: String,
    external_delay: Duration,
}

impl DemoPipeline {
    pub fn new(client: reqwest::Client, config: &DemoConfig, database_faults: FaultInjector) -> Self {
        Self {
            client,
            database_delay: Duration::from_millis(config.database_delay_ms),
            database_faults,
            external_url: config.external_url.clone(),
            external_delay: Duration::from_millis(config.external_delay_ms),
        }
    }

    /// Run both steps; the first failure ends the request.
    pub async fn run(&self) -> Result<(), DemoError> {
        self.database_call().await?;
        self.external_api_call().await
    }

    async fn database_call(&self) -> Result<(), DemoError> {
        let span = tracing::info_span!(
            "database.query",
            db.system = "postgresql",
            db.name = "users",
            db.statement = "SELECT * FROM users",
            error = field::Empty,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );

        async {
            tokio::time::sleep(self.database_delay).await;

            if self.database_faults.trips() {
                let err = DemoError::Database("database connection error".to_string());
                record_error(&Span::current(), &err);
                return Err(err);
            }
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn external_api_call(&self) -> Result<(), DemoError> {
        let span = tracing::info_span!(
            "external.api.request",
            otel.kind = "client",
            api.name = "payment-service",
            api.endpoint = "/api/v1/process",
            url.full = %self.external_url,
            http.response.status_code = field::Empty,
            error = field::Empty,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );

        async {
            let span = Span::current();
            let fail = |e: reqwest::Error| {
                let err = DemoError::External(e.to_string());
                record_error(&span, &err);
                err
            };

            let response = self
                .client
                .get(&self.external_url)
                .headers(inject_span(&span))
                .send()
                .await
                .map_err(fail)?;
            span.record("http.response.status_code", response.status().as_u16());

            let body = response.bytes().await.map_err(fail)?;
            tracing::debug!(bytes = body.len(), "External API responded");

            tokio::time::sleep(self.external_delay).await;
            Ok(())
        }
        .instrument(span)
        .await
    }
}
