//! In-memory BatchStore
//!
//! Mutex-guarded maps; supports injected write failures for exercising the
//! engine's bounded persistence retry.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use contracts::{
    AttemptId, AttemptOutcome, AttemptStatus, Batch, BatchId, BatchStatus, BatchStore,
    ContractError, DeliveryAttempt, NewAttempt, NewBatch,
};
use tracing::debug;

/// Failure injection for tests: how many `create_attempt` calls for a
/// given recipient id should fail before succeeding (`u32::MAX` = always).
#[derive(Debug, Default, Clone)]
pub struct MemoryStoreConfig {
    pub attempt_create_failures: HashMap<String, u32>,
}

#[derive(Debug, Default)]
struct Inner {
    batches: HashMap<BatchId, Batch>,
    batch_order: Vec<BatchId>,
    attempts: HashMap<AttemptId, DeliveryAttempt>,
    attempt_order: Vec<AttemptId>,
    /// Attempt ids already counted per batch; makes increments replay-safe
    counted: HashMap<BatchId, HashSet<AttemptId>>,
    /// Remaining injected failures per recipient id
    pending_failures: HashMap<String, u32>,
}

/// Reference in-memory store
#[derive(Debug)]
pub struct MemoryBatchStore {
    inner: Mutex<Inner>,
}

impl MemoryBatchStore {
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                pending_failures: config.attempt_create_failures,
                ..Inner::default()
            }),
        }
    }
}

impl Default for MemoryBatchStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchStore for MemoryBatchStore {
    async fn create_batch(&self, new_batch: NewBatch) -> Result<Batch, ContractError> {
        let batch = Batch {
            id: BatchId::generate(),
            created_at: Utc::now(),
            template_id: new_batch.template_id,
            body: new_batch.body,
            total_recipients: new_batch.total_recipients,
            sent: 0,
            failed: 0,
            status: BatchStatus::Pending,
            filters_used: new_batch.filters_used,
            audit_degraded: false,
        };

        let mut inner = self.inner.lock().unwrap();
        inner.batch_order.push(batch.id);
        inner.batches.insert(batch.id, batch.clone());
        debug!(batch_id = %batch.id, total = batch.total_recipients, "Batch created");
        Ok(batch)
    }

    async fn get_batch(&self, id: BatchId) -> Result<Batch, ContractError> {
        let inner = self.inner.lock().unwrap();
        inner
            .batches
            .get(&id)
            .cloned()
            .ok_or(ContractError::BatchNotFound { batch_id: id })
    }

    async fn update_batch_status(
        &self,
        id: BatchId,
        status: BatchStatus,
    ) -> Result<(), ContractError> {
        let mut inner = self.inner.lock().unwrap();
        let batch = inner
            .batches
            .get_mut(&id)
            .ok_or(ContractError::BatchNotFound { batch_id: id })?;

        if !batch.status.can_transition_to(status) {
            return Err(ContractError::IllegalTransition {
                batch_id: id,
                from: batch.status,
                to: status,
            });
        }

        batch.status = status;
        Ok(())
    }

    async fn increment_counters(
        &self,
        batch_id: BatchId,
        attempt_id: AttemptId,
        outcome: AttemptOutcome,
    ) -> Result<(), ContractError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.batches.contains_key(&batch_id) {
            return Err(ContractError::BatchNotFound { batch_id });
        }

        // Replay after crash recovery must not double-count
        let counted = inner.counted.entry(batch_id).or_default();
        if !counted.insert(attempt_id) {
            return Ok(());
        }

        let batch = inner.batches.get_mut(&batch_id).unwrap();
        if batch.sent + batch.failed >= batch.total_recipients as u64 {
            return Err(ContractError::store(format!(
                "counters for batch {batch_id} would exceed total_recipients"
            )));
        }

        match outcome {
            AttemptOutcome::Sent => batch.sent += 1,
            AttemptOutcome::Failed(_) => batch.failed += 1,
        }
        Ok(())
    }

    async fn mark_audit_degraded(&self, id: BatchId) -> Result<(), ContractError> {
        let mut inner = self.inner.lock().unwrap();
        let batch = inner
            .batches
            .get_mut(&id)
            .ok_or(ContractError::BatchNotFound { batch_id: id })?;
        batch.audit_degraded = true;
        Ok(())
    }

    async fn create_attempt(
        &self,
        new_attempt: NewAttempt,
    ) -> Result<DeliveryAttempt, ContractError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(remaining) = inner.pending_failures.get_mut(&new_attempt.recipient_id) {
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Err(ContractError::store(format!(
                    "injected write failure for recipient '{}'",
                    new_attempt.recipient_id
                )));
            }
        }

        // At most one in-flight attempt per (batch, recipient)
        if let Some(batch_id) = new_attempt.batch_id {
            let duplicate = inner.attempts.values().any(|a| {
                a.batch_id == Some(batch_id)
                    && a.recipient_id == new_attempt.recipient_id
                    && a.status == AttemptStatus::Pending
            });
            if duplicate {
                return Err(ContractError::DuplicatePendingAttempt {
                    batch_id,
                    recipient_id: new_attempt.recipient_id,
                });
            }
        }

        let attempt = DeliveryAttempt {
            id: AttemptId::generate(),
            batch_id: new_attempt.batch_id,
            recipient_id: new_attempt.recipient_id,
            recipient_name: new_attempt.recipient_name,
            whatsapp: new_attempt.whatsapp,
            rendered_body: new_attempt.rendered_body,
            template_id: new_attempt.template_id,
            status: AttemptStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            failure: None,
        };

        inner.attempt_order.push(attempt.id);
        inner.attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn resolve_attempt(
        &self,
        id: AttemptId,
        outcome: AttemptOutcome,
    ) -> Result<DeliveryAttempt, ContractError> {
        let mut inner = self.inner.lock().unwrap();
        let attempt = inner
            .attempts
            .get_mut(&id)
            .ok_or(ContractError::AttemptNotFound { attempt_id: id })?;

        if attempt.status != AttemptStatus::Pending {
            return Err(ContractError::store(format!(
                "attempt {id} already resolved"
            )));
        }

        attempt.resolved_at = Some(Utc::now());
        match outcome {
            AttemptOutcome::Sent => attempt.status = AttemptStatus::Sent,
            AttemptOutcome::Failed(failure) => {
                attempt.status = AttemptStatus::Failed;
                attempt.failure = Some(failure);
            }
        }
        Ok(attempt.clone())
    }

    async fn list_batches(&self) -> Result<Vec<Batch>, ContractError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .batch_order
            .iter()
            .rev()
            .filter_map(|id| inner.batches.get(id).cloned())
            .collect())
    }

    async fn list_attempts(
        &self,
        batch_id: BatchId,
    ) -> Result<Vec<DeliveryAttempt>, ContractError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attempt_order
            .iter()
            .filter_map(|id| inner.attempts.get(id))
            .filter(|a| a.batch_id == Some(batch_id))
            .cloned()
            .collect())
    }

    async fn list_recent_attempts(
        &self,
        limit: usize,
    ) -> Result<Vec<DeliveryAttempt>, ContractError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attempt_order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| inner.attempts.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BatchStore, Recipient, SendFailure};

    fn recipient(id: &str) -> Recipient {
        Recipient {
            id: id.into(),
            name: format!("Recipient {id}"),
            whatsapp: format!("+55119999{id:0>4}"),
            plan: None,
            email: None,
        }
    }

    fn new_batch(total: usize) -> NewBatch {
        NewBatch {
            template_id: None,
            body: "Olá {{nome}}".into(),
            total_recipients: total,
            filters_used: None,
        }
    }

    async fn batch_with_attempt(
        store: &MemoryBatchStore,
    ) -> (Batch, DeliveryAttempt) {
        let batch = store.create_batch(new_batch(3)).await.unwrap();
        store
            .update_batch_status(batch.id, BatchStatus::InProgress)
            .await
            .unwrap();
        let attempt = store
            .create_attempt(NewAttempt::for_batch(
                batch.id,
                &recipient("r1"),
                "Olá Recipient r1".into(),
                None,
            ))
            .await
            .unwrap();
        (batch, attempt)
    }

    #[tokio::test]
    async fn test_create_and_get_batch() {
        let store = MemoryBatchStore::new();
        let batch = store.create_batch(new_batch(5)).await.unwrap();
        let fetched = store.get_batch(batch.id).await.unwrap();
        assert_eq!(fetched.total_recipients, 5);
        assert_eq!(fetched.status, BatchStatus::Pending);
        assert!(!fetched.audit_degraded);
    }

    #[tokio::test]
    async fn test_illegal_transition_rejected() {
        let store = MemoryBatchStore::new();
        let batch = store.create_batch(new_batch(1)).await.unwrap();

        let result = store
            .update_batch_status(batch.id, BatchStatus::Completed)
            .await;
        assert!(matches!(
            result,
            Err(ContractError::IllegalTransition { .. })
        ));

        // Pending -> Cancelled is also forbidden; cancel only applies mid-run
        let result = store
            .update_batch_status(batch.id, BatchStatus::Cancelled)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_pending_attempt_rejected() {
        let store = MemoryBatchStore::new();
        let (batch, _attempt) = batch_with_attempt(&store).await;

        let result = store
            .create_attempt(NewAttempt::for_batch(
                batch.id,
                &recipient("r1"),
                "again".into(),
                None,
            ))
            .await;
        assert!(matches!(
            result,
            Err(ContractError::DuplicatePendingAttempt { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolved_attempt_allows_new_attempt() {
        let store = MemoryBatchStore::new();
        let (batch, attempt) = batch_with_attempt(&store).await;

        store
            .resolve_attempt(attempt.id, AttemptOutcome::Failed(SendFailure::timeout("t")))
            .await
            .unwrap();

        // A retry is a new attempt record, permitted once the first resolved
        let retry = store
            .create_attempt(NewAttempt::for_batch(
                batch.id,
                &recipient("r1"),
                "retry".into(),
                None,
            ))
            .await;
        assert!(retry.is_ok());
    }

    #[tokio::test]
    async fn test_increment_counters_idempotent() {
        let store = MemoryBatchStore::new();
        let (batch, attempt) = batch_with_attempt(&store).await;

        store
            .increment_counters(batch.id, attempt.id, AttemptOutcome::Sent)
            .await
            .unwrap();
        // Crash-recovery replay of the same attempt id
        store
            .increment_counters(batch.id, attempt.id, AttemptOutcome::Sent)
            .await
            .unwrap();

        let fetched = store.get_batch(batch.id).await.unwrap();
        assert_eq!(fetched.sent, 1);
        assert_eq!(fetched.failed, 0);
    }

    #[tokio::test]
    async fn test_resolve_is_terminal() {
        let store = MemoryBatchStore::new();
        let (_batch, attempt) = batch_with_attempt(&store).await;

        store
            .resolve_attempt(attempt.id, AttemptOutcome::Sent)
            .await
            .unwrap();
        let again = store.resolve_attempt(attempt.id, AttemptOutcome::Sent).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_list_batches_newest_first() {
        let store = MemoryBatchStore::new();
        let first = store.create_batch(new_batch(1)).await.unwrap();
        let second = store.create_batch(new_batch(1)).await.unwrap();

        let listed = store.list_batches().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_recent_attempts_capped_and_newest_first() {
        let store = MemoryBatchStore::new();
        let batch = store.create_batch(new_batch(5)).await.unwrap();
        store
            .update_batch_status(batch.id, BatchStatus::InProgress)
            .await
            .unwrap();

        for i in 0..5 {
            let attempt = store
                .create_attempt(NewAttempt::for_batch(
                    batch.id,
                    &recipient(&format!("r{i}")),
                    "oi".into(),
                    None,
                ))
                .await
                .unwrap();
            store
                .resolve_attempt(attempt.id, AttemptOutcome::Sent)
                .await
                .unwrap();
        }

        let recent = store.list_recent_attempts(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].recipient_id, "r4");
        assert_eq!(recent[2].recipient_id, "r2");
    }

    #[tokio::test]
    async fn test_injected_failures_then_success() {
        let mut config = MemoryStoreConfig::default();
        config.attempt_create_failures.insert("r1".into(), 2);
        let store = MemoryBatchStore::with_config(config);
        let batch = store.create_batch(new_batch(1)).await.unwrap();
        store
            .update_batch_status(batch.id, BatchStatus::InProgress)
            .await
            .unwrap();

        let make = || NewAttempt::for_batch(batch.id, &recipient("r1"), "oi".into(), None);
        assert!(store.create_attempt(make()).await.is_err());
        assert!(store.create_attempt(make()).await.is_err());
        assert!(store.create_attempt(make()).await.is_ok());
    }

    #[tokio::test]
    async fn test_audit_degraded_flag() {
        let store = MemoryBatchStore::new();
        let batch = store.create_batch(new_batch(1)).await.unwrap();
        store.mark_audit_degraded(batch.id).await.unwrap();
        assert!(store.get_batch(batch.id).await.unwrap().audit_degraded);
    }
}
