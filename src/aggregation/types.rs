//! Records and the combined response of the aggregation handler.

use serde::{Deserialize, Serialize};

/// One row of the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub quantity: i32,
    pub price: f32,
}

/// Outcome of the processing stage as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Success,
    Failed,
}

/// Body of a successful `/products` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    #[serde(rename = "products")]
    pub records: Vec<Product>,
    #[serde(rename = "slow_status")]
    pub dependent_status: u16,
    #[serde(rename = "slow_message")]
    pub dependent_message: String,
    pub process_status: ProcessStatus,
}
