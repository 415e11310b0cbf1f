//! Local post-processing of fetched records.

use std::time::Duration;

use thiserror::Error;
use tracing::{field, Instrument};

use crate::aggregation::faults::FaultInjector;
use crate::aggregation::types::{ProcessStatus, Product};
use crate::observability::{metrics, tracing::record_error};

/// Processing of the fetched records failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("data processing failed")]
pub struct ProcessError;

/// Processing stage, run on the handler's own task.
#[derive(Debug, Clone)]
pub struct Processor {
    delay: Duration,
    faults: FaultInjector,
}

impl Processor {
    pub fn new(delay: Duration, faults: FaultInjector) -> Self {
        Self { delay, faults }
    }

    pub async fn process(&self, products: &[Product]) -> Result<ProcessStatus, ProcessError> {
        let span = tracing::info_span!(
            "process_data",
            processed_count = field::Empty,
            error = field::Empty,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );

        async {
            tokio::time::sleep(self.delay).await;

            let span = tracing::Span::current();
            if self.faults.trips() {
                record_error(&span, &ProcessError);
                metrics::record_stage("process", "failed");
                return Err(ProcessError);
            }

            span.record("processed_count", products.len());
            metrics::record_stage("process", "ok");
            Ok(ProcessStatus::Success)
        }
        .instrument(span)
        .await
    }
}
