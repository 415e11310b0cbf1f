//! Route handlers.

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};

use crate::aggregation::{DependentRequest, DependentService};
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// `GET /products`: the aggregation handler.
pub async fn get_products(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let aggregated = state
        .aggregator
        .aggregate(DependentRequest::new(method, uri, headers))
        .await?;

    // Encode before any status is chosen so a failure here is still a clean 500.
    let body = serde_json::to_vec(&aggregated).map_err(|e| {
        tracing::error!(error = %e, "Failed to encode products response");
        ApiError::from(e)
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

/// `GET /api`: the slow dependent endpoint.
pub async fn slow_api(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let request = DependentRequest::new(method, uri, headers);
    match state.slow_api.call(&request).await {
        Ok(response) => {
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
            (status, response.body).into_response()
        }
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}

/// `GET /`: database simulation plus external API call.
pub async fn root(State(state): State<AppState>) -> Result<String, ApiError> {
    state.demo.run().await?;
    Ok(format!(
        "Request processed successfully at {}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    ))
}

/// `GET /health`: untraced liveness probe.
pub async fn health() -> &'static str {
    "OK"
}
