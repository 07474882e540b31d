//! BatchStore trait - durable record of batches and attempts
//!
//! Progress must survive a crash or restart, so every mutation is an
//! incremental update. Counter increments are keyed by attempt id and must
//! be idempotent under crash-recovery replay.

use crate::{
    AttemptId, AttemptOutcome, Batch, BatchId, BatchStatus, ContractError, DeliveryAttempt,
    NewAttempt, NewBatch,
};

/// Durable batch/attempt store trait
///
/// Implementations provide their own concurrency safety; multiple batch
/// workers write to different batches simultaneously, never to the same
/// batch concurrently.
#[trait_variant::make(BatchStore: Send)]
pub trait LocalBatchStore {
    /// Create a batch record in `Pending` state
    async fn create_batch(&self, new_batch: NewBatch) -> Result<Batch, ContractError>;

    /// Fetch one batch
    async fn get_batch(&self, id: BatchId) -> Result<Batch, ContractError>;

    /// Transition batch status; rejects transitions the lifecycle forbids
    async fn update_batch_status(
        &self,
        id: BatchId,
        status: BatchStatus,
    ) -> Result<(), ContractError>;

    /// Bump `sent` or `failed` for the given resolved attempt
    ///
    /// Idempotent per `attempt_id`: re-applying after a crash-recovery
    /// replay must not double-count.
    async fn increment_counters(
        &self,
        batch_id: BatchId,
        attempt_id: AttemptId,
        outcome: AttemptOutcome,
    ) -> Result<(), ContractError>;

    /// Flag the batch as having an incomplete audit trail
    async fn mark_audit_degraded(&self, id: BatchId) -> Result<(), ContractError>;

    /// Create a `Pending` attempt record
    ///
    /// # Errors
    /// Rejects a second pending attempt for the same (batch, recipient).
    async fn create_attempt(
        &self,
        new_attempt: NewAttempt,
    ) -> Result<DeliveryAttempt, ContractError>;

    /// Resolve a pending attempt to `Sent` or `Failed`; terminal once set
    async fn resolve_attempt(
        &self,
        id: AttemptId,
        outcome: AttemptOutcome,
    ) -> Result<DeliveryAttempt, ContractError>;

    /// All batches, newest first
    async fn list_batches(&self) -> Result<Vec<Batch>, ContractError>;

    /// All attempts of one batch, in creation order
    async fn list_attempts(&self, batch_id: BatchId) -> Result<Vec<DeliveryAttempt>, ContractError>;

    /// Most recent attempts across all batches and ad-hoc sends
    async fn list_recent_attempts(
        &self,
        limit: usize,
    ) -> Result<Vec<DeliveryAttempt>, ContractError>;
}
