//! # Dispatch Engine
//!
//! Orchestrates bulk sends: one sequential worker task per batch, gated by
//! the shared rate limiter, paced by randomized inter-message jitter,
//! recording every attempt through the `BatchStore` contract.
//!
//! Deliberately not parallel across recipients: the inter-message delay
//! is provider-imposed anti-flood behavior, a correctness requirement.

mod engine;
mod error;
mod handle;
mod jitter;
mod metrics;
pub mod senders;
mod worker;

pub use engine::{DispatchEngine, DispatchRequest};
pub use error::EngineError;
pub use handle::{BatchHandle, BatchOutcome};
pub use metrics::{ProgressSnapshot, WorkerMetrics};
