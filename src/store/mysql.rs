//! MySQL-backed product store.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;

use crate::aggregation::Product;
use crate::store::{ProductStore, StoreError, PRODUCTS_QUERY};

/// Pool of MySQL connections shared by all requests.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Open the pool. Fails if the first connection cannot be established.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        tracing::info!(max_connections, "Connected to the MySQL product store");
        Ok(Self { pool })
    }
}

fn scan_product(row: &MySqlRow) -> Result<Product, StoreError> {
    let scan = |e: sqlx::Error| StoreError::Scan(e.to_string());
    product_from_columns(
        row.try_get("id").map_err(scan)?,
        row.try_get("name").map_err(scan)?,
        row.try_get("quantity").map_err(scan)?,
        row.try_get("price").map_err(scan)?,
    )
}

/// Narrow the widened `BIGINT`/`DOUBLE` columns of one row to a `Product`.
fn product_from_columns(id: u64, name: String, quantity: i64, price: f64) -> Result<Product, StoreError> {
    let id = u32::try_from(id).map_err(|_| StoreError::Scan(format!("id: {} out of range", id)))?;
    let quantity = i32::try_from(quantity)
        .map_err(|_| StoreError::Scan(format!("quantity: {} out of range", quantity)))?;

    Ok(Product {
        id,
        name,
        quantity,
        price: price as f32,
    })
}

#[async_trait]
impl ProductStore for MySqlStore {
    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        let mut rows = sqlx::query(PRODUCTS_QUERY).fetch(&self.pool);
        let mut products = Vec::new();

        loop {
            let row = match rows.try_next().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                // Nothing read yet means the query itself failed.
                Err(e) if products.is_empty() => return Err(StoreError::Query(e.to_string())),
                Err(e) => return Err(StoreError::Iterate(e.to_string())),
            };
            products.push(scan_product(&row)?);
        }

        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_casts_loose_columns() {
        assert!(PRODUCTS_QUERY.contains("CAST(id AS UNSIGNED) AS id"));
        assert!(PRODUCTS_QUERY.contains("CAST(quantity AS SIGNED) AS quantity"));
        assert!(PRODUCTS_QUERY.contains("CAST(price AS DOUBLE) AS price"));
        assert!(PRODUCTS_QUERY.ends_with("FROM products"));
    }

    #[test]
    fn test_decimal_price_narrows() {
        let product = product_from_columns(7, "Lamp".into(), -2, 19.99).unwrap();
        assert_eq!(
            product,
            Product {
                id: 7,
                name: "Lamp".into(),
                quantity: -2,
                price: 19.99,
            }
        );
    }

    #[test]
    fn test_out_of_range_columns_fail_scan() {
        let err = product_from_columns(u64::from(u32::MAX) + 1, "Lamp".into(), 1, 1.0).unwrap_err();
        assert!(matches!(err, StoreError::Scan(msg) if msg.starts_with("id:")));

        let err = product_from_columns(1, "Lamp".into(), i64::from(i32::MIN) - 1, 1.0).unwrap_err();
        assert!(matches!(err, StoreError::Scan(msg) if msg.starts_with("quantity:")));
    }
}
