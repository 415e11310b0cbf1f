//! Product store subsystem.
//!
//! # Data Flow
//! ```text
//! StoreClient (injected into the aggregation handler)
//!     → store.fetch_all span
//!     → ProductStore backend
//!         memory.rs (seeded from config)
//!         mysql.rs  (sqlx pool, `mysql` feature)
//! ```
//!
//! # Design Decisions
//! - The handle is passed in at construction; there is no global connection
//! - An absent backend is a `NotInitialized` error, not a panic
//! - A fetch either returns every row or fails; partial reads are discarded

pub mod memory;
#[cfg(feature = "mysql")]
pub mod mysql;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{field, Instrument};

use crate::aggregation::Product;
use crate::observability::{metrics, tracing::record_error};

pub use memory::MemoryStore;
#[cfg(feature = "mysql")]
pub use mysql::MySqlStore;

/// SQL issued by the relational backend.
///
/// Columns are cast so that signed `INT` ids and `DECIMAL` prices decode
/// into the row types without strict column-type mismatches.
pub const PRODUCTS_QUERY: &str = "SELECT CAST(id AS UNSIGNED) AS id, name, \
     CAST(quantity AS SIGNED) AS quantity, CAST(price AS DOUBLE) AS price FROM products";

/// Errors surfaced by a product fetch.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection not initialized")]
    NotInitialized,

    #[error("error connecting to the database: {0}")]
    Connect(String),

    #[error("error querying products: {0}")]
    Query(String),

    #[error("error scanning product row: {0}")]
    Scan(String),

    #[error("error iterating over product rows: {0}")]
    Iterate(String),
}

/// A backend able to read every product.
///
/// Implementations must be safe for concurrent readers.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError>;
}

/// Process-wide store handle shared by all in-flight requests.
#[derive(Clone, Default)]
pub struct StoreClient {
    backend: Option<Arc<dyn ProductStore>>,
}

impl StoreClient {
    pub fn new(backend: Arc<dyn ProductStore>) -> Self {
        Self { backend: Some(backend) }
    }

    /// A client with no backend; every fetch fails with `NotInitialized`.
    pub fn uninitialized() -> Self {
        Self { backend: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Fetch every product under a `store.fetch_all` span.
    pub async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        let span = tracing::info_span!(
            "store.fetch_all",
            db.statement = PRODUCTS_QUERY,
            product_count = field::Empty,
            error = field::Empty,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );

        let result = async {
            match &self.backend {
                Some(backend) => backend.fetch_all().await,
                None => Err(StoreError::NotInitialized),
            }
        }
        .instrument(span.clone())
        .await;

        match &result {
            Ok(products) => {
                span.record("product_count", products.len());
                metrics::record_stage("fetch", "ok");
            }
            Err(e) => {
                record_error(&span, e);
                metrics::record_stage("fetch", "error");
                tracing::warn!(parent: &span, error = %e, "Product fetch failed");
            }
        }
        result
    }
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
