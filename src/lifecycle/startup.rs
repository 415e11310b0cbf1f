//! Startup helpers.
//!
//! # Design Decisions
//! - Fail fast: a configured database that cannot be reached is fatal
//! - No database and no seeded products leaves the store uninitialized;
//!   the service still starts and `/products` reports it

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::store::{MemoryStore, StoreClient, StoreError};

/// Build the store client described by `config`.
pub async fn connect_store(config: &StoreConfig) -> Result<StoreClient, StoreError> {
    if let Some(url) = &config.database_url {
        return connect_database(url, config.max_connections).await;
    }

    if config.products.is_empty() {
        tracing::warn!("No database configured and no seeded products; store left uninitialized");
        return Ok(StoreClient::uninitialized());
    }

    tracing::info!(products = config.products.len(), "Serving seeded products from memory");
    Ok(StoreClient::new(Arc::new(MemoryStore::new(config.products.clone()))))
}

#[cfg(feature = "mysql")]
async fn connect_database(url: &str, max_connections: u32) -> Result<StoreClient, StoreError> {
    let store = crate::store::MySqlStore::connect(url, max_connections).await?;
    Ok(StoreClient::new(Arc::new(store)))
}

#[cfg(not(feature = "mysql"))]
async fn connect_database(_url: &str, _max_connections: u32) -> Result<StoreClient, StoreError> {
    tracing::warn!("DATABASE_URL set but built without the `mysql` feature; store left uninitialized");
    Ok(StoreClient::uninitialized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::Product;

    #[tokio::test]
    async fn test_empty_config_is_uninitialized() {
        let client = connect_store(&StoreConfig::default()).await.unwrap();
        assert!(!client.is_initialized());
    }

    #[tokio::test]
    async fn test_seeded_products_served() {
        let config = StoreConfig {
            products: vec![Product {
                id: 9,
                name: "Drill".to_string(),
                quantity: 1,
                price: 79.0,
            }],
            ..StoreConfig::default()
        };
        let client = connect_store(&config).await.unwrap();
        assert_eq!(client.fetch_all().await.unwrap().len(), 1);
    }
}
