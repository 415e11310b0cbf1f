//! Products service library.
//!
//! A small HTTP service whose `/products` handler validates the request,
//! reads the product store, runs a slow dependent call concurrently with
//! local processing, and joins the results, with every step traced under
//! one request span.

pub mod aggregation;
pub mod config;
pub mod demo;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::AppConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
