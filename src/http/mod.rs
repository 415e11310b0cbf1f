//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request ID, root span with extracted trace context)
//!     → server.rs (Axum router, timeout, metrics)
//!     → handlers.rs (/, /api, /products, /health)
//!     → response.rs (error → status + plain-text body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{build_router, AppState, HttpServer};
