//! Calls to the slow dependent service.
//!
//! # Responsibilities
//! - Describe the sub-request issued on behalf of an inbound request
//! - Simulate the slow internal endpoint (`SlowApi`), also served on `/api`
//!
//! # Design Decisions
//! - The caller is a trait so the handler can be exercised with doubles
//! - `SlowApi` never fails; the error type exists for other implementations

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, Uri};
use chrono::{SecondsFormat, Utc};
use thiserror::Error;

/// The inbound request the dependent call is made for.
#[derive(Debug, Clone)]
pub struct DependentRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl DependentRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self { method, uri, headers }
    }
}

impl Default for DependentRequest {
    fn default() -> Self {
        Self::new(Method::GET, Uri::from_static("/"), HeaderMap::new())
    }
}

/// Status and body returned by the dependent service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependentError {
    #[error("dependent service call failed: {0}")]
    Call(String),

    /// The background task ended without handing back a result.
    #[error("dependent service call ended without a result")]
    Dropped,
}

#[async_trait]
pub trait DependentService: Send + Sync {
    async fn call(&self, request: &DependentRequest) -> Result<DependentResponse, DependentError>;
}

/// In-process simulation of the slow internal endpoint.
#[derive(Debug, Clone)]
pub struct SlowApi {
    delay: Duration,
}

impl SlowApi {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl DependentService for SlowApi {
    async fn call(&self, request: &DependentRequest) -> Result<DependentResponse, DependentError> {
        let traceparent = request
            .headers
            .get("traceparent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::debug!(
            method = %request.method,
            uri = %request.uri,
            traceparent = %traceparent,
            "Slow API call"
        );
        tokio::time::sleep(self.delay).await;

        Ok(DependentResponse {
            status: 200,
            body: format!(
                "Slow API response at {}\n",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        })
    }
}
