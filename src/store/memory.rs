//! In-memory product store.

use async_trait::async_trait;

use crate::aggregation::Product;
use crate::store::{ProductStore, StoreError};

/// Fixed product table held in memory. Reads clone the rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    products: Vec<Product>,
}

impl MemoryStore {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.clone())
    }
}
