//! Request validation stage.

use std::time::Duration;

use thiserror::Error;
use tracing::{field, Instrument};

use crate::aggregation::faults::FaultInjector;
use crate::observability::{metrics, tracing::record_error};

/// The request was rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request validation failed")]
pub struct ValidationError;

/// First gate of the aggregation handler.
#[derive(Debug, Clone)]
pub struct Validator {
    delay: Duration,
    faults: FaultInjector,
}

impl Validator {
    pub fn new(delay: Duration, faults: FaultInjector) -> Self {
        Self { delay, faults }
    }

    /// Wait out the simulated cost, then pass or reject with one draw.
    pub async fn validate(&self) -> Result<(), ValidationError> {
        let span = tracing::info_span!(
            "validate_request",
            error = field::Empty,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );

        async {
            tokio::time::sleep(self.delay).await;

            if self.faults.trips() {
                record_error(&tracing::Span::current(), &ValidationError);
                metrics::record_stage("validate", "rejected");
                tracing::info!("Request rejected by validation");
                return Err(ValidationError);
            }

            metrics::record_stage("validate", "ok");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
