//! Startup recovery scan
//!
//! A batch left `InProgress` at process restart is resumed, not discarded:
//! existing attempt records mark how far the worker got, so the engine can
//! continue from the first unattempted recipient. Recipients are attempted
//! strictly in input order, which makes the attempt count a deterministic
//! resume marker.

use contracts::{Batch, BatchStatus, BatchStore, ContractError};
use tracing::{info, instrument};

/// Where an interrupted batch should pick up
#[derive(Debug, Clone)]
pub struct ResumePoint {
    /// The interrupted batch record
    pub batch: Batch,
    /// Index of the first recipient with no attempt record
    pub next_index: usize,
}

/// Find batches interrupted mid-run and derive their resume positions.
///
/// Call once at startup before accepting new dispatches.
#[instrument(name = "recovery_scan", skip(store))]
pub async fn scan_interrupted<B>(store: &B) -> Result<Vec<ResumePoint>, ContractError>
where
    B: BatchStore + Sync,
{
    let mut points = Vec::new();

    for batch in store.list_batches().await? {
        if batch.status != BatchStatus::InProgress {
            continue;
        }
        let attempted = store.list_attempts(batch.id).await?.len();
        info!(
            batch_id = %batch.id,
            attempted,
            total = batch.total_recipients,
            "Interrupted batch found"
        );
        points.push(ResumePoint {
            next_index: attempted,
            batch,
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBatchStore;
    use contracts::{AttemptOutcome, NewAttempt, NewBatch, Recipient};

    fn recipient(n: usize) -> Recipient {
        Recipient {
            id: format!("r{n}"),
            name: format!("Recipient {n}"),
            whatsapp: format!("+55119999{n:0>4}"),
            plan: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn test_scan_finds_interrupted_batch_with_resume_index() {
        let store = MemoryBatchStore::new();
        let batch = store
            .create_batch(NewBatch {
                template_id: None,
                body: "oi".into(),
                total_recipients: 5,
                filters_used: None,
            })
            .await
            .unwrap();
        store
            .update_batch_status(batch.id, BatchStatus::InProgress)
            .await
            .unwrap();

        // Two recipients attempted before the "crash"
        for n in 0..2 {
            let attempt = store
                .create_attempt(NewAttempt::for_batch(
                    batch.id,
                    &recipient(n),
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

        let points = scan_interrupted(&store).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].batch.id, batch.id);
        assert_eq!(points[0].next_index, 2);
    }

    #[tokio::test]
    async fn test_scan_ignores_settled_batches() {
        let store = MemoryBatchStore::new();
        let batch = store
            .create_batch(NewBatch {
                template_id: None,
                body: "oi".into(),
                total_recipients: 1,
                filters_used: None,
            })
            .await
            .unwrap();
        store
            .update_batch_status(batch.id, BatchStatus::InProgress)
            .await
            .unwrap();
        store
            .update_batch_status(batch.id, BatchStatus::Completed)
            .await
            .unwrap();

        // Pending (never started) batches are also not resume candidates
        store
            .create_batch(NewBatch {
                template_id: None,
                body: "oi".into(),
                total_recipients: 1,
                filters_used: None,
            })
            .await
            .unwrap();

        let points = scan_interrupted(&store).await.unwrap();
        assert!(points.is_empty());
    }
}
