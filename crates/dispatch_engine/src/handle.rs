//! BatchHandle - caller-facing handle to a running batch worker

use std::sync::Arc;

use contracts::{BatchId, BatchStatus};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::error::EngineError;
use crate::metrics::{ProgressSnapshot, WorkerMetrics};

/// Final state of a batch worker
#[derive(Debug, Clone, Copy)]
pub struct BatchOutcome {
    pub batch_id: BatchId,
    pub status: BatchStatus,
    pub sent: u64,
    pub failed: u64,
}

/// Handle to a running batch worker
///
/// Returned by `dispatch`/`resume` while processing continues in the
/// background. Dropping the handle does not stop the worker; use
/// `cancel()` for that.
pub struct BatchHandle {
    batch_id: BatchId,
    cancel: CancellationToken,
    metrics: Arc<WorkerMetrics>,
    worker_handle: JoinHandle<BatchOutcome>,
}

impl BatchHandle {
    pub(crate) fn new(
        batch_id: BatchId,
        cancel: CancellationToken,
        metrics: Arc<WorkerMetrics>,
        worker_handle: JoinHandle<BatchOutcome>,
    ) -> Self {
        Self {
            batch_id,
            cancel,
            metrics,
            worker_handle,
        }
    }

    /// Batch id this handle controls
    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    /// Live progress counters (lock-free; store stays authoritative)
    pub fn progress(&self) -> ProgressSnapshot {
        self.metrics.snapshot()
    }

    /// Request cooperative cancellation
    ///
    /// Takes effect at the next recipient boundary; a pending rate-limit
    /// or jitter sleep is interrupted promptly, an in-flight send is not.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker to finish and return its outcome
    #[instrument(name = "batch_handle_wait", skip(self), fields(batch_id = %self.batch_id))]
    pub async fn wait(self) -> Result<BatchOutcome, EngineError> {
        self.worker_handle.await.map_err(|e| EngineError::Worker {
            message: e.to_string(),
        })
    }
}
