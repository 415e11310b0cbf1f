//! Request aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! GET /products
//!     → validation.rs (delay, injected rejection)
//!     → store (fetch every product)
//!     → dependent.rs (spawned, slow call) ∥ processing.rs (delay, injected failure)
//!     → handler.rs (join, assemble AggregatedResponse)
//! ```
//!
//! # Design Decisions
//! - Stages are small structs built once and shared by all requests
//! - Failure injection goes through `faults.rs` so tests can pin outcomes
//! - One trace context per request; every stage opens its own child span

pub mod dependent;
pub mod faults;
pub mod handler;
pub mod processing;
pub mod types;
pub mod validation;

pub use dependent::{DependentError, DependentRequest, DependentResponse, DependentService, SlowApi};
pub use faults::{FaultInjector, FixedDraws, RandomSource, ThreadRandom};
pub use handler::{AggregateError, Aggregator};
pub use processing::{ProcessError, Processor};
pub use types::{AggregatedResponse, ProcessStatus, Product};
pub use validation::{ValidationError, Validator};
