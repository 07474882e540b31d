//! # Batch Store
//!
//! Reference implementation of the `BatchStore` contract plus the startup
//! recovery scan. The in-memory store is the store of record for tests and
//! single-run CLI usage; a durable backend implements the same trait.

mod memory;
mod recovery;

pub use memory::{MemoryBatchStore, MemoryStoreConfig};
pub use recovery::{scan_interrupted, ResumePoint};
