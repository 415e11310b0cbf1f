//! Error responses.
//!
//! # Design Decisions
//! - Plain-text bodies carrying the formatted error, no JSON envelope
//! - Status is chosen by the error class, never by the handler

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::aggregation::AggregateError;
use crate::demo::DemoError;

/// Any failure a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Demo(#[from] DemoError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Aggregate(e) => e.status_code(),
            ApiError::Serialization(_) | ApiError::Demo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{ProcessError, ValidationError};
    use crate::store::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(AggregateError::from(ValidationError)), StatusCode::BAD_REQUEST),
            (ApiError::from(AggregateError::from(StoreError::NotInitialized)), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(AggregateError::from(ProcessError)), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(DemoError::Database("down".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{}", err);
        }
    }

    #[test]
    fn test_bodies() {
        let err = ApiError::from(AggregateError::from(StoreError::NotInitialized));
        assert_eq!(err.to_string(), "Failed to fetch products: database connection not initialized");

        let err = ApiError::from(DemoError::External("timed out".into()));
        assert_eq!(err.to_string(), "External API error: timed out");
    }

    #[tokio::test]
    async fn test_into_response_is_plain_text() {
        let response = ApiError::from(AggregateError::from(ValidationError)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"request validation failed");
    }
}
