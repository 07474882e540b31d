//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Persisted records carry `chrono::DateTime<Utc>` wall-clock timestamps
//! - The rate window uses monotonic instants and is never persisted

mod attempt;
mod batch;
mod engine_config;
mod error;
mod plan;
mod recipient;
mod sender;
mod store;
mod template;

pub use attempt::*;
pub use batch::*;
pub use engine_config::*;
pub use error::*;
pub use plan::*;
pub use recipient::Recipient;
pub use sender::*;
pub use store::*;
pub use template::*;
