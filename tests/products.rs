//! End-to-end behavior of the HTTP surface.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;

use products_service::aggregation::{
    Aggregator, DependentError, DependentRequest, DependentResponse, DependentService, FixedDraws,
    ThreadRandom,
};
use products_service::http::build_router;
use products_service::store::StoreClient;
use products_service::AppState;

mod common;

use common::{body_string, get, CountingStore};

#[tokio::test]
async fn test_all_stages_succeed() {
    let config = common::fast_config();
    let app = common::passing_app(&config, common::memory_store(common::sample_products()));

    let response = get(app, "/products").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"].to_str().unwrap(), "application/json");

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["products"].as_array().unwrap().len(), 2);
    assert_eq!(body["products"][0]["name"], "Keyboard");
    assert_eq!(body["products"][1]["quantity"], 25);
    assert_eq!(body["process_status"], "success");
    assert_eq!(body["slow_status"], 200);
    assert!(body["slow_message"].as_str().unwrap().starts_with("Slow API response at "));
}

#[tokio::test]
async fn test_validation_failure_never_reaches_store() {
    let mut config = common::fast_config();
    config.stages.validation_failure_rate = 1.0;
    let store = Arc::new(CountingStore::new(common::sample_products()));
    let app = common::app(&config, StoreClient::new(store.clone()), Arc::new(ThreadRandom));

    let response = get(app, "/products").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("request validation failed"));
    assert_eq!(store.fetch_count(), 0);
}

#[tokio::test]
async fn test_uninitialized_store() {
    let config = common::fast_config();
    let app = common::passing_app(&config, StoreClient::uninitialized());

    let response = get(app, "/products").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_string(response).await;
    assert!(body.contains("database connection not initialized"));
    assert!(!body.contains("products\""));
}

#[tokio::test]
async fn test_scan_failure_is_internal_error() {
    let config = common::fast_config();
    let app = common::passing_app(&config, StoreClient::new(Arc::new(common::BrokenStore)));

    let response = get(app, "/products").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_string(response).await,
        "Failed to fetch products: error scanning product row: quantity: mismatched types"
    );
}

#[tokio::test]
async fn test_processing_failure_is_internal_error() {
    let mut config = common::fast_config();
    config.stages.processing_failure_rate = 0.3;
    let store = Arc::new(CountingStore::new(common::sample_products()));
    // Validation draw passes, processing draw fails.
    let source = Arc::new(FixedDraws::new([0.9, 0.1], 0.9));
    let app = common::app(&config, StoreClient::new(store.clone()), source);

    let response = get(app, "/products").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_string(response).await;
    assert_eq!(body, "Failed to process data: data processing failed");
    assert!(serde_json::from_str::<Value>(&body).is_err());
    assert_eq!(store.fetch_count(), 1);
}

/// Dependent service answering with a fixed, non-default status and body.
struct CannedDependent;

#[async_trait]
impl DependentService for CannedDependent {
    async fn call(&self, _: &DependentRequest) -> Result<DependentResponse, DependentError> {
        Ok(DependentResponse { status: 203, body: "canned\n".into() })
    }
}

#[tokio::test]
async fn test_dependent_result_is_echoed_verbatim() {
    let config = common::fast_config();
    let source = Arc::new(FixedDraws::always_pass());
    let mut state = AppState::new(&config, StoreClient::uninitialized(), source.clone()).unwrap();
    state.aggregator = Arc::new(Aggregator::from_config(
        &config.stages,
        common::memory_store(common::sample_products()),
        Arc::new(CannedDependent),
        source,
    ));
    let app = build_router(&config, state);

    let response = get(app, "/products").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["slow_status"], 203);
    assert_eq!(body["slow_message"], "canned\n");
}

#[tokio::test]
async fn test_product_count_matches_store() {
    let config = common::fast_config();
    for n in [0usize, 1, 7] {
        let products: Vec<_> = common::sample_products().into_iter().cycle().take(n).collect();
        let app = common::passing_app(&config, common::memory_store(products.clone()));

        let response = get(app, "/products").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["products"].as_array().unwrap().len(), n);
    }
}

#[tokio::test]
async fn test_health_is_plain_ok() {
    let app = common::passing_app(&common::fast_config(), StoreClient::uninitialized());

    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");
}

#[tokio::test]
async fn test_slow_api_endpoint() {
    let app = common::passing_app(&common::fast_config(), StoreClient::uninitialized());

    let response = get(app, "/api").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.starts_with("Slow API response at "));
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let app = common::passing_app(&common::fast_config(), StoreClient::uninitialized());

    let response = get(app, "/health").await;
    let request_id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(request_id.len(), 36);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = common::passing_app(&common::fast_config(), StoreClient::uninitialized());
    assert_eq!(get(app, "/nope").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_root_calls_external_api() {
    let (addr, seen) = common::start_mock_backend("{\"ok\":true}").await;
    let mut config = common::fast_config();
    config.demo.external_url = format!("http://{}/get", addr);
    let app = common::passing_app(&config, StoreClient::uninitialized());

    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.starts_with("Request processed successfully at "));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("GET /get HTTP/1.1"));
}

#[tokio::test]
async fn test_root_database_failure() {
    let mut config = common::fast_config();
    config.demo.database_failure_rate = 1.0;
    let app = common::app(&config, StoreClient::uninitialized(), Arc::new(ThreadRandom));

    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Database error: database connection error");
}

#[tokio::test]
async fn test_root_external_failure() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let mut config = common::fast_config();
    config.demo.external_url = format!("http://{}/get", addr);
    let app = common::passing_app(&config, StoreClient::uninitialized());

    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.starts_with("External API error: "));
}
