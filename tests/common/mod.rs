//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

use products_service::aggregation::{FixedDraws, Product, RandomSource};
use products_service::config::AppConfig;
use products_service::http::build_router;
use products_service::store::{MemoryStore, ProductStore, StoreClient, StoreError};
use products_service::AppState;

/// Config with every delay shortened and failure injection off.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.stages.validation_delay_ms = 5;
    config.stages.validation_failure_rate = 0.0;
    config.stages.processing_delay_ms = 20;
    config.stages.processing_failure_rate = 0.0;
    config.stages.dependent_delay_ms = 40;
    config.demo.database_delay_ms = 5;
    config.demo.database_failure_rate = 0.0;
    config.demo.external_delay_ms = 5;
    config.demo.use_system_proxy = false;
    config.observability.tracing_enabled = false;
    config
}

pub fn sample_products() -> Vec<Product> {
    vec![
        Product { id: 1, name: "Keyboard".into(), quantity: 10, price: 49.99 },
        Product { id: 2, name: "Mouse".into(), quantity: 25, price: 19.5 },
    ]
}

/// Store double counting how often it was read.
pub struct CountingStore {
    products: Vec<Product>,
    pub fetches: AtomicUsize,
}

impl CountingStore {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products, fetches: AtomicUsize::new(0) }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductStore for CountingStore {
    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.products.clone())
    }
}

/// Store double whose reads always fail mid-scan.
pub struct BrokenStore;

#[async_trait]
impl ProductStore for BrokenStore {
    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        Err(StoreError::Scan("quantity: mismatched types".into()))
    }
}

pub fn memory_store(products: Vec<Product>) -> StoreClient {
    StoreClient::new(Arc::new(MemoryStore::new(products)))
}

/// Router over the given store and random source.
pub fn app(config: &AppConfig, store: StoreClient, source: Arc<dyn RandomSource>) -> Router {
    let state = AppState::new(config, store, source).unwrap();
    build_router(config, state)
}

pub fn passing_app(config: &AppConfig, store: StoreClient) -> Router {
    app(config, store, Arc::new(FixedDraws::always_pass()))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start a simple mock backend that returns a fixed response.
///
/// Every raw request received is pushed to the returned log.
pub async fn start_mock_backend(response: &'static str) -> (SocketAddr, Arc<std::sync::Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let log = log.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        log.lock().unwrap().push(String::from_utf8_lossy(&buf[..n]).into_owned());

                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}
