//! Batch worker - sequential per-recipient dispatch loop
//!
//! One worker per batch. The loop never parallelizes across recipients and
//! never skips one: rate pressure and jitter only ever delay. Send
//! failures are recorded and the loop moves on; only cancellation stops it
//! early.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use contracts::{
    AttemptId, AttemptOutcome, BatchId, BatchStatus, BatchStore, ContractError, EngineConfig,
    MessageSender, NewAttempt, PersistRetryConfig, Recipient,
};
use rate_limiter::{Gate, HourlyRateLimiter};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::handle::BatchOutcome;
use crate::jitter;
use crate::metrics::WorkerMetrics;

/// Everything one batch worker needs, owned for the task's lifetime
pub(crate) struct WorkerContext<S, B> {
    pub batch_id: BatchId,
    pub recipients: Vec<Recipient>,
    /// First recipient index to attempt (non-zero when resuming)
    pub start_index: usize,
    /// Message body before per-recipient substitution
    pub body: String,
    pub template_id: Option<String>,
    /// Batch-level variables, merged over per-recipient fields
    pub variables: HashMap<String, String>,
    pub sender: Arc<S>,
    pub store: Arc<B>,
    pub limiter: Arc<HourlyRateLimiter>,
    pub config: EngineConfig,
    pub progress: Arc<WorkerMetrics>,
    pub cancel: CancellationToken,
}

/// Run one batch to completion, cancellation, or the end of the list.
#[instrument(
    name = "batch_worker",
    skip(ctx),
    fields(batch_id = %ctx.batch_id, total = ctx.recipients.len(), start = ctx.start_index)
)]
pub(crate) async fn run_batch_worker<S, B>(ctx: WorkerContext<S, B>) -> BatchOutcome
where
    S: MessageSender + Sync,
    B: BatchStore + Sync,
{
    let WorkerContext {
        batch_id,
        recipients,
        start_index,
        body,
        template_id,
        variables,
        sender,
        store,
        limiter,
        config,
        progress,
        cancel,
    } = ctx;

    if start_index == 0 {
        let marked = persist(&config.persist_retry, "update_batch_status", || {
            let store = Arc::clone(&store);
            async move {
                store
                    .update_batch_status(batch_id, BatchStatus::InProgress)
                    .await
            }
        })
        .await;
        if marked.is_none() {
            error!(batch_id = %batch_id, "Could not mark batch in progress, continuing");
        }
        info!(batch_id = %batch_id, total = recipients.len(), "Batch started");
    } else {
        info!(batch_id = %batch_id, start_index, "Batch resumed");
    }

    let mut final_status = BatchStatus::Completed;

    'batch: for (index, recipient) in recipients.iter().enumerate().skip(start_index) {
        // Cancellation is cooperative: checked at each recipient boundary,
        // recipients past this point get no attempt record
        if cancel.is_cancelled() {
            final_status = BatchStatus::Cancelled;
            break 'batch;
        }

        // Rate gate: back-pressure only delays, it never drops a recipient.
        // Re-check after every wait: a concurrent batch may have taken the
        // freed slot.
        loop {
            match limiter.try_acquire() {
                Gate::Allowed => break,
                Gate::Throttled { retry_after } => {
                    progress.inc_rate_waits();
                    metrics::counter!("dispatch_rate_waits_total").increment(1);
                    debug!(
                        batch_id = %batch_id,
                        index,
                        wait_ms = retry_after.as_millis() as u64,
                        "Hourly ceiling reached, waiting for capacity"
                    );
                    tokio::select! {
                        () = cancel.cancelled() => {
                            final_status = BatchStatus::Cancelled;
                            break 'batch;
                        }
                        () = sleep(retry_after) => {}
                    }
                }
            }
        }

        process_recipient(
            batch_id,
            recipient,
            &body,
            template_id.as_deref(),
            &variables,
            sender.as_ref(),
            &store,
            &config.persist_retry,
            &progress,
        )
        .await;

        // Anti-flood pacing between messages, regardless of outcome
        let delay = jitter::sample(&config.jitter);
        if !delay.is_zero() {
            tokio::select! {
                () = cancel.cancelled() => {
                    final_status = BatchStatus::Cancelled;
                    break 'batch;
                }
                () = sleep(delay) => {}
            }
        }
    }

    let finalized = persist(&config.persist_retry, "update_batch_status", || {
        let store = Arc::clone(&store);
        async move { store.update_batch_status(batch_id, final_status).await }
    })
    .await;
    if finalized.is_none() {
        error!(batch_id = %batch_id, status = %final_status, "Could not persist final batch status");
    }

    match final_status {
        BatchStatus::Cancelled => warn!(batch_id = %batch_id, "Batch cancelled"),
        _ => info!(
            batch_id = %batch_id,
            sent = progress.sent(),
            failed = progress.failed(),
            "Batch completed"
        ),
    }

    // The store record is authoritative for final counts (it carries
    // pre-resume progress the in-process counters never saw)
    match store.get_batch(batch_id).await {
        Ok(batch) => BatchOutcome {
            batch_id,
            status: batch.status,
            sent: batch.sent,
            failed: batch.failed,
        },
        Err(e) => {
            error!(batch_id = %batch_id, error = %e, "Could not read back final batch state");
            let snapshot = progress.snapshot();
            BatchOutcome {
                batch_id,
                status: final_status,
                sent: snapshot.sent,
                failed: snapshot.failed,
            }
        }
    }
}

/// Render, record, send, resolve one recipient, start to finish.
///
/// Store failures degrade the audit trail but never stop delivery.
#[allow(clippy::too_many_arguments)]
async fn process_recipient<S, B>(
    batch_id: BatchId,
    recipient: &Recipient,
    body: &str,
    template_id: Option<&str>,
    variables: &HashMap<String, String>,
    sender: &S,
    store: &Arc<B>,
    retry: &PersistRetryConfig,
    progress: &WorkerMetrics,
) where
    S: MessageSender + Sync,
    B: BatchStore + Sync,
{
    let today = Local::now().format("%d/%m/%Y").to_string();
    let vars = renderer::recipient_vars(recipient, variables, &today);
    let rendered = renderer::render(body, &vars);

    let mut audit_gap = false;

    let new_attempt = NewAttempt::for_batch(
        batch_id,
        recipient,
        rendered.clone(),
        template_id.map(Into::into),
    );
    let attempt = persist(retry, "create_attempt", || {
        let store = Arc::clone(store);
        let new_attempt = new_attempt.clone();
        async move { store.create_attempt(new_attempt).await }
    })
    .await;

    if attempt.is_none() {
        audit_gap = true;
        warn!(
            batch_id = %batch_id,
            recipient = %recipient.whatsapp,
            "Attempt record lost, delivery continues"
        );
    }
    // Counter idempotency key; a generated one keeps aggregates correct
    // even when the attempt record itself was lost
    let counter_key = attempt
        .as_ref()
        .map_or_else(AttemptId::generate, |a| a.id);

    let outcome = match sender.send(recipient, &rendered).await {
        Ok(()) => {
            progress.inc_sent();
            metrics::counter!("dispatch_attempts_total", "outcome" => "sent").increment(1);
            info!(
                batch_id = %batch_id,
                recipient = %recipient.whatsapp,
                "Message sent"
            );
            AttemptOutcome::Sent
        }
        Err(failure) => {
            progress.inc_failed();
            metrics::counter!(
                "dispatch_attempts_total",
                "outcome" => "failed",
                "kind" => failure.kind.to_string()
            )
            .increment(1);
            warn!(
                batch_id = %batch_id,
                recipient = %recipient.whatsapp,
                kind = %failure.kind,
                reason = %failure.message,
                "Message failed"
            );
            AttemptOutcome::Failed(failure)
        }
    };

    if let Some(a) = &attempt {
        let resolved = persist(retry, "resolve_attempt", || {
            let store = Arc::clone(store);
            let outcome = outcome.clone();
            let id = a.id;
            async move { store.resolve_attempt(id, outcome).await }
        })
        .await;
        if resolved.is_none() {
            audit_gap = true;
        }
    }

    let counted = persist(retry, "increment_counters", || {
        let store = Arc::clone(store);
        let outcome = outcome.clone();
        async move {
            store
                .increment_counters(batch_id, counter_key, outcome)
                .await
        }
    })
    .await;
    if counted.is_none() {
        audit_gap = true;
    }

    if audit_gap {
        progress.inc_audit_gaps();
        if let Err(e) = store.mark_audit_degraded(batch_id).await {
            error!(batch_id = %batch_id, error = %e, "Could not flag degraded audit trail");
        }
    }
}

/// Bounded-backoff retry for store writes.
///
/// `None` means the write was abandoned; callers treat that as an audit
/// gap, never as a reason to stop delivering.
async fn persist<T, F, Fut>(retry: &PersistRetryConfig, op: &str, mut write: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ContractError>>,
{
    let attempts = retry.max_attempts.max(1);
    let mut backoff = retry.backoff();

    for attempt in 1..=attempts {
        match write().await {
            Ok(value) => return Some(value),
            Err(e) => {
                warn!(op, attempt, error = %e, "Store write failed");
                if attempt < attempts {
                    sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
    None
}
