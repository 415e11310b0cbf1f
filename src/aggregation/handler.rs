//! Aggregation handler.
//!
//! # Flow
//! ```text
//! Validating ──err──▶ Rejected (400)
//!     │
//! Fetching ────err──▶ Failed (500)
//!     │
//!     ├── spawn: dependent.call ──oneshot──┐
//!     │                                    │
//! Processing (this task) ──err──▶ Failed (500), dependent call canceled
//!     │                                    │
//! Joining ◀────────────────────────────────┘
//!     │
//! Responding
//! ```
//!
//! # Design Decisions
//! - All stage spans are children of one `products.handler` span; the
//!   spawned call is instrumented with a span created under it
//! - The dependent call is tied to a cancellation token: an early failure
//!   cancels and awaits it, and dropping the handler future cancels it
//! - The first error short-circuits; nothing is retried

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{field, Instrument, Span};

use crate::aggregation::dependent::{DependentError, DependentRequest, DependentService};
use crate::aggregation::faults::{FaultInjector, RandomSource};
use crate::aggregation::processing::{ProcessError, Processor};
use crate::aggregation::types::AggregatedResponse;
use crate::aggregation::validation::{ValidationError, Validator};
use crate::config::StageConfig;
use crate::observability::{metrics, tracing::record_error};
use crate::store::{StoreClient, StoreError};

/// Terminal failure of one aggregation request.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to fetch products: {0}")]
    Fetch(#[from] StoreError),

    #[error("Failed to process data: {0}")]
    Process(#[from] ProcessError),

    #[error("Dependent service error: {0}")]
    Dependent(#[from] DependentError),
}

impl AggregateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AggregateError::Validation(_) => StatusCode::BAD_REQUEST,
            AggregateError::Fetch(_) | AggregateError::Process(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AggregateError::Dependent(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Sequences validation, fetch, the concurrent dependent call and processing.
pub struct Aggregator {
    validator: Validator,
    store: StoreClient,
    dependent: Arc<dyn DependentService>,
    processor: Processor,
}

impl Aggregator {
    pub fn new(
        validator: Validator,
        store: StoreClient,
        dependent: Arc<dyn DependentService>,
        processor: Processor,
    ) -> Self {
        Self {
            validator,
            store,
            dependent,
            processor,
        }
    }

    /// Build the stages from config, drawing failures from `source`.
    pub fn from_config(
        config: &StageConfig,
        store: StoreClient,
        dependent: Arc<dyn DependentService>,
        source: Arc<dyn RandomSource>,
    ) -> Self {
        let validator = Validator::new(
            Duration::from_millis(config.validation_delay_ms),
            FaultInjector::new(config.validation_failure_rate, source.clone()),
        );
        let processor = Processor::new(
            Duration::from_millis(config.processing_delay_ms),
            FaultInjector::new(config.processing_failure_rate, source),
        );
        Self::new(validator, store, dependent, processor)
    }

    /// Run one request through every stage under a `products.handler` span.
    pub async fn aggregate(
        &self,
        request: DependentRequest,
    ) -> Result<AggregatedResponse, AggregateError> {
        let span = tracing::info_span!(
            "products.handler",
            product_count = field::Empty,
            error = field::Empty,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );

        let result = self.run(request).instrument(span.clone()).await;
        match &result {
            Ok(response) => {
                span.record("product_count", response.records.len());
            }
            Err(e) => {
                record_error(&span, e);
                tracing::warn!(parent: &span, error = %e, status = %e.status_code(), "Aggregation failed");
            }
        }
        result
    }

    async fn run(&self, request: DependentRequest) -> Result<AggregatedResponse, AggregateError> {
        self.validator.validate().await?;

        let records = self.store.fetch_all().await?;

        let cancel = CancellationToken::new();
        // Fires on every exit from here on, including a dropped future.
        let _teardown = cancel.clone().drop_guard();

        let (tx, rx) = oneshot::channel();
        let dependent = Arc::clone(&self.dependent);
        let call_span = tracing::info_span!(
            "dependent.call",
            http.request.method = %request.method,
            url.path = %request.uri.path(),
            http.response.status_code = field::Empty,
            error = field::Empty,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );
        let call_cancel = cancel.clone();
        let call = tokio::spawn(
            async move {
                tokio::select! {
                    _ = call_cancel.cancelled() => {
                        tracing::debug!("Dependent call canceled");
                        metrics::record_stage("dependent", "canceled");
                    }
                    result = dependent.call(&request) => {
                        let span = Span::current();
                        match &result {
                            Ok(response) => {
                                span.record("http.response.status_code", response.status);
                                metrics::record_stage("dependent", "ok");
                            }
                            Err(e) => {
                                record_error(&span, e);
                                metrics::record_stage("dependent", "error");
                            }
                        }
                        // The receiver is gone only if the handler already returned.
                        let _ = tx.send(result);
                    }
                }
            }
            .instrument(call_span),
        );

        let process_status = match self.processor.process(&records).await {
            Ok(status) => status,
            Err(e) => {
                cancel.cancel();
                if let Err(join) = call.await {
                    tracing::warn!(error = %join, "Dependent call task did not finish cleanly");
                }
                return Err(e.into());
            }
        };

        let dependent = rx.await.map_err(|_| DependentError::Dropped)??;

        Ok(AggregatedResponse {
            records,
            dependent_status: dependent.status,
            dependent_message: dependent.body,
            process_status,
        })
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("validator", &self.validator)
            .field("store", &self.store)
            .field("processor", &self.processor)
            .finish_non_exhaustive()
    }
}
