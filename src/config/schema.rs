//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::aggregation::Product;

/// Root configuration for the products service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind host, port).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Delays and failure rates of the aggregation stages.
    pub stages: StageConfig,

    /// Settings for the external-dependency demo pipeline on `/`.
    pub demo: DemoConfig,

    /// Product store settings.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind. Overridden by `PORT`.
    pub port: u16,
}

impl ListenerConfig {
    /// Full bind address, `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8883,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Artificial delays and injected failure rates of the aggregation stages.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StageConfig {
    pub validation_delay_ms: u64,

    /// Probability in `[0, 1]` that validation rejects the request.
    pub validation_failure_rate: f32,

    pub processing_delay_ms: u64,

    /// Probability in `[0, 1]` that processing fails.
    pub processing_failure_rate: f32,

    /// Delay of the slow dependent endpoint, also served on `/api`.
    pub dependent_delay_ms: u64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            validation_delay_ms: 1000,
            validation_failure_rate: 0.2,
            processing_delay_ms: 1500,
            processing_failure_rate: 0.3,
            dependent_delay_ms: 2000,
        }
    }
}

/// Demo pipeline served on `/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    pub database_delay_ms: u64,

    /// Probability in `[0, 1]` of a simulated database error.
    pub database_failure_rate: f32,

    /// URL fetched by the external API call.
    pub external_url: String,

    /// Post-call processing delay of the external API call.
    pub external_delay_ms: u64,

    /// Honor `HTTP_PROXY`/`HTTPS_PROXY` for the external call.
    pub use_system_proxy: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            database_delay_ms: 100,
            database_failure_rate: 0.1,
            external_url: "https://httpbin.org/get".to_string(),
            external_delay_ms: 200,
            use_system_proxy: true,
        }
    }
}

/// Product store configuration.
///
/// With neither a database URL nor seeded products the store client stays
/// uninitialized and `/products` answers with a 500.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// MySQL connection URL. Overridden by `DATABASE_URL`.
    pub database_url: Option<String>,

    /// Pool size for the MySQL store.
    pub max_connections: u32,

    /// Products served from memory when no database URL is set.
    pub products: Vec<Product>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            products: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Export spans over OTLP. When false only logs are emitted.
    pub tracing_enabled: bool,

    /// Trace resource identity. Overridden by `SERVICE_NAME`.
    pub service_name: String,

    /// Deployment environment attached to the trace resource.
    pub environment: String,

    /// OTLP/gRPC collector address. Overridden by `OTEL_EXPORTER_OTLP_ENDPOINT`.
    pub otlp_endpoint: String,

    /// Upper bound for flushing the span pipeline on shutdown.
    pub shutdown_timeout_secs: u64,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "products_service=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            tracing_enabled: true,
            service_name: "products-service".to_string(),
            environment: "demo".to_string(),
            otlp_endpoint: "127.0.0.1:4317".to_string(),
            shutdown_timeout_secs: 5,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8883");
        assert_eq!(config.observability.otlp_endpoint, "127.0.0.1:4317");
        assert_eq!(config.observability.shutdown_timeout_secs, 5);
        assert_eq!(config.stages.validation_failure_rate, 0.2);
        assert_eq!(config.stages.processing_failure_rate, 0.3);
        assert!(config.store.database_url.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [listener]
            port = 9000

            [observability]
            log_format = "json"

            [[store.products]]
            id = 1
            name = "Widget"
            quantity = 3
            price = 9.5
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.store.products.len(), 1);
        assert_eq!(config.store.products[0].name, "Widget");
        assert_eq!(config.stages.dependent_delay_ms, 2000);
    }
}
