//! DispatchEngine - accepts batches, spawns workers, tracks active ones

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Local;
use contracts::{
    AttemptOutcome, BatchId, BatchStatus, BatchStore, DeliveryAttempt, EngineConfig,
    MessageSender, MessageTemplate, NewAttempt, NewBatch, Recipient, TemplateSpec,
};
use rate_limiter::{Gate, HourlyRateLimiter, StatsReporter};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::error::EngineError;
use crate::handle::BatchHandle;
use crate::metrics::WorkerMetrics;
use crate::worker::{run_batch_worker, WorkerContext};

/// One bulk-send request
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Recipients, attempted strictly in this order
    pub recipients: Vec<Recipient>,
    /// Named template or inline body
    pub template: TemplateSpec,
    /// Batch-level variables, merged over per-recipient fields
    pub variables: HashMap<String, String>,
    /// Opaque audit snapshot of the selection criteria
    pub filters_used: Option<serde_json::Value>,
}

impl DispatchRequest {
    pub fn new(recipients: Vec<Recipient>, template: TemplateSpec) -> Self {
        Self {
            recipients,
            template,
            variables: HashMap::new(),
            filters_used: None,
        }
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_filters(mut self, filters: serde_json::Value) -> Self {
        self.filters_used = Some(filters);
        self
    }
}

/// The dispatch engine
///
/// Owns the shared limiter, the store, the sender, and a registry of
/// active workers (one per batch id, never two).
pub struct DispatchEngine<S, B> {
    sender: Arc<S>,
    store: Arc<B>,
    limiter: Arc<HourlyRateLimiter>,
    config: EngineConfig,
    templates: Vec<MessageTemplate>,
    active: Arc<Mutex<HashMap<BatchId, CancellationToken>>>,
}

impl<S, B> DispatchEngine<S, B>
where
    S: MessageSender + Sync + 'static,
    B: BatchStore + Sync + 'static,
{
    pub fn new(
        sender: Arc<S>,
        store: Arc<B>,
        limiter: Arc<HourlyRateLimiter>,
        config: EngineConfig,
        templates: Vec<MessageTemplate>,
    ) -> Self {
        Self {
            sender,
            store,
            limiter,
            config,
            templates,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Shared store handle (history queries)
    pub fn store(&self) -> &Arc<B> {
        &self.store
    }

    /// Read-only rate consumption view for operator displays
    pub fn stats_reporter(&self) -> StatsReporter {
        StatsReporter::new(Arc::clone(&self.limiter))
    }

    /// Batch ids with a running worker
    pub fn active_batches(&self) -> Vec<BatchId> {
        self.active.lock().unwrap().keys().copied().collect()
    }

    /// Accept a batch: validate, create the record, start the worker.
    ///
    /// Returns immediately with a handle while processing continues in the
    /// background. Validation failures reject the request before any batch
    /// record exists.
    #[instrument(name = "engine_dispatch", skip(self, request), fields(recipients = request.recipients.len()))]
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<BatchHandle, EngineError> {
        if request.recipients.is_empty() {
            return Err(EngineError::EmptyRecipients);
        }
        let (body, template_id) = self.resolve_template(&request.template)?;

        let batch = self
            .store
            .create_batch(NewBatch {
                template_id: template_id.clone(),
                body: body.clone(),
                total_recipients: request.recipients.len(),
                filters_used: request.filters_used,
            })
            .await?;

        info!(
            batch_id = %batch.id,
            recipients = batch.total_recipients,
            template = template_id.as_deref().unwrap_or("<inline>"),
            "Batch accepted"
        );

        self.spawn_worker(
            batch.id,
            request.recipients,
            0,
            body,
            template_id,
            request.variables,
        )
    }

    /// Re-attach a worker to a batch left `InProgress` by a previous run.
    ///
    /// The caller re-supplies the original recipient list (input order is
    /// the resume marker); recipients that already have an attempt record
    /// are skipped.
    #[instrument(name = "engine_resume", skip(self, recipients, variables), fields(batch_id = %batch_id))]
    pub async fn resume(
        &self,
        batch_id: BatchId,
        recipients: Vec<Recipient>,
        variables: HashMap<String, String>,
    ) -> Result<BatchHandle, EngineError> {
        let batch = self.store.get_batch(batch_id).await?;
        if batch.status != BatchStatus::InProgress {
            return Err(EngineError::BatchNotResumable {
                batch_id,
                status: batch.status,
            });
        }
        if recipients.len() != batch.total_recipients {
            return Err(EngineError::RecipientCountMismatch {
                batch_id,
                expected: batch.total_recipients,
                got: recipients.len(),
            });
        }

        let start_index = self.store.list_attempts(batch_id).await?.len();
        info!(batch_id = %batch_id, start_index, "Resuming interrupted batch");

        self.spawn_worker(
            batch_id,
            recipients,
            start_index,
            batch.body,
            batch.template_id,
            variables,
        )
    }

    /// Request cooperative cancellation of a running batch.
    ///
    /// Returns false when no worker is active for the id (already
    /// finished, cancelled, or never started here).
    pub fn cancel(&self, batch_id: BatchId) -> bool {
        match self.active.lock().unwrap().get(&batch_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// One ad-hoc send outside any batch.
    ///
    /// Shares the rate window with batch traffic but skips jitter; there
    /// is no following message to pace against.
    #[instrument(name = "engine_send_one", skip(self, recipient, template, variables), fields(recipient = %recipient.whatsapp))]
    pub async fn send_one(
        &self,
        recipient: &Recipient,
        template: TemplateSpec,
        variables: HashMap<String, String>,
    ) -> Result<DeliveryAttempt, EngineError> {
        let (body, template_id) = self.resolve_template(&template)?;

        loop {
            match self.limiter.try_acquire() {
                Gate::Allowed => break,
                Gate::Throttled { retry_after } => tokio::time::sleep(retry_after).await,
            }
        }

        let today = Local::now().format("%d/%m/%Y").to_string();
        let vars = renderer::recipient_vars(recipient, &variables, &today);
        let rendered = renderer::render(&body, &vars);

        let attempt = self
            .store
            .create_attempt(NewAttempt::ad_hoc(recipient, rendered.clone(), template_id))
            .await?;

        let outcome = match self.sender.send(recipient, &rendered).await {
            Ok(()) => AttemptOutcome::Sent,
            Err(failure) => AttemptOutcome::Failed(failure),
        };

        Ok(self.store.resolve_attempt(attempt.id, outcome).await?)
    }

    /// Resolve the template spec to (body, template id)
    fn resolve_template(
        &self,
        spec: &TemplateSpec,
    ) -> Result<(String, Option<String>), EngineError> {
        let (body, template_id) = match spec {
            TemplateSpec::Inline { body } => (body.clone(), None),
            TemplateSpec::Template { id } => {
                let template = self
                    .templates
                    .iter()
                    .find(|t| t.id == *id)
                    .ok_or_else(|| EngineError::TemplateNotFound {
                        template_id: id.clone(),
                    })?;
                (template.body.clone(), Some(template.id.clone()))
            }
        };

        if body.trim().is_empty() {
            return Err(EngineError::Contract(
                contracts::ContractError::dispatch_validation("message body is empty"),
            ));
        }
        Ok((body, template_id))
    }

    /// Register the batch as active and start its worker task
    fn spawn_worker(
        &self,
        batch_id: BatchId,
        recipients: Vec<Recipient>,
        start_index: usize,
        body: String,
        template_id: Option<String>,
        variables: HashMap<String, String>,
    ) -> Result<BatchHandle, EngineError> {
        let cancel = CancellationToken::new();
        {
            let mut active = self.active.lock().unwrap();
            if active.contains_key(&batch_id) {
                return Err(EngineError::BatchAlreadyActive { batch_id });
            }
            active.insert(batch_id, cancel.clone());
        }

        let progress = Arc::new(WorkerMetrics::new());
        let ctx = WorkerContext {
            batch_id,
            recipients,
            start_index,
            body,
            template_id,
            variables,
            sender: Arc::clone(&self.sender),
            store: Arc::clone(&self.store),
            limiter: Arc::clone(&self.limiter),
            config: self.config.clone(),
            progress: Arc::clone(&progress),
            cancel: cancel.clone(),
        };

        let active = Arc::clone(&self.active);
        let worker_handle = tokio::spawn(async move {
            let outcome = run_batch_worker(ctx).await;
            active.lock().unwrap().remove(&batch_id);
            outcome
        });

        Ok(BatchHandle::new(batch_id, cancel, progress, worker_handle))
    }
}
