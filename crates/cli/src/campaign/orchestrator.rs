//! Campaign orchestrator - coordinates all components.
//!
//! Builds the store, limiter, sender, and engine from the plan, runs one
//! batch to completion, and collects the final statistics. Ctrl+C cancels
//! the batch cooperatively instead of killing sends mid-flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use batch_store::MemoryBatchStore;
use contracts::{BatchStore, DispatchPlan, MessageSender, Recipient, SenderConfig, TemplateSpec};
use dispatch_engine::senders::{HttpSender, HttpSenderConfig, LogSender};
use dispatch_engine::{DispatchEngine, DispatchRequest};
use observability::{record_batch_settled, record_rate_snapshot};
use rate_limiter::HourlyRateLimiter;
use tracing::{info, warn};

use super::CampaignStats;

/// How often the orchestrator logs live progress
const PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

/// Campaign configuration
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// The loaded dispatch plan
    pub plan: DispatchPlan,

    /// Recipients, in send order
    pub recipients: Vec<Recipient>,

    /// Named template or inline body to send
    pub template: TemplateSpec,

    /// Batch-level template variables
    pub variables: HashMap<String, String>,

    /// Opaque filter snapshot for the audit record
    pub filters: Option<serde_json::Value>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// How many recent attempts to include in the final stats
    pub recent: usize,
}

/// Main campaign orchestrator
pub struct Campaign {
    config: CampaignConfig,
}

impl Campaign {
    /// Create a new campaign with the given configuration
    pub fn new(config: CampaignConfig) -> Self {
        Self { config }
    }

    /// Run the campaign to completion or cancellation
    pub async fn run(self) -> Result<CampaignStats> {
        match self.config.plan.sender.clone() {
            SenderConfig::Log => {
                info!("Sender: log (nothing leaves the process)");
                let sender = Arc::new(LogSender::default());
                Self::run_with_sender(self.config, sender).await
            }
            SenderConfig::Http {
                url,
                token,
                timeout_ms,
            } => {
                info!(url = %url, "Sender: http gateway");
                let sender = Arc::new(
                    HttpSender::new(HttpSenderConfig {
                        url,
                        token,
                        timeout: Duration::from_millis(timeout_ms),
                    })
                    .context("Failed to build http sender")?,
                );
                Self::run_with_sender(self.config, sender).await
            }
        }
    }

    /// Shared campaign logic, generic over the sender implementation
    async fn run_with_sender<S>(config: CampaignConfig, sender: Arc<S>) -> Result<CampaignStats>
    where
        S: MessageSender + Sync + 'static,
    {
        let start_time = Instant::now();

        // Metrics endpoint (optional)
        if let Some(port) = config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let store = Arc::new(MemoryBatchStore::new());
        let limiter = Arc::new(HourlyRateLimiter::new(config.plan.engine.hourly_limit));

        let engine = Arc::new(DispatchEngine::new(
            sender,
            Arc::clone(&store),
            Arc::clone(&limiter),
            config.plan.engine.clone(),
            config.plan.templates.clone(),
        ));

        // Startup recovery contract: resume anything a previous run left
        // mid-flight. A fresh in-memory store has nothing, but a durable
        // store behind the same trait would.
        let interrupted = batch_store::scan_interrupted(store.as_ref())
            .await
            .context("Recovery scan failed")?;
        for point in &interrupted {
            warn!(
                batch_id = %point.batch.id,
                next_index = point.next_index,
                "Interrupted batch found; re-dispatch it with the original list to resume"
            );
        }

        info!(
            recipients = config.recipients.len(),
            hourly_limit = config.plan.engine.hourly_limit,
            jitter_min_ms = config.plan.engine.jitter.min_ms,
            jitter_max_ms = config.plan.engine.jitter.max_ms,
            "Dispatching campaign"
        );

        let mut request = DispatchRequest::new(config.recipients, config.template)
            .with_variables(config.variables);
        if let Some(filters) = config.filters {
            request = request.with_filters(filters);
        }

        let reporter = engine.stats_reporter();
        let handle = engine
            .dispatch(request)
            .await
            .context("Dispatch rejected")?;
        let batch_id = handle.batch_id();

        info!(batch_id = %batch_id, "Campaign accepted, processing in background");

        // Ctrl+C cancels cooperatively at the next recipient boundary
        let signal_engine = Arc::clone(&engine);
        let signal_task = tokio::spawn(async move {
            shutdown_signal().await;
            warn!(batch_id = %batch_id, "Shutdown requested, cancelling batch");
            signal_engine.cancel(batch_id);
        });

        // Periodic progress + live rate gauges
        let progress_store = Arc::clone(&store);
        let progress_reporter = reporter.clone();
        let progress_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let rate = progress_reporter.current();
                record_rate_snapshot(rate.sent, rate.limit, rate.reset_in);
                if let Ok(batch) = progress_store.get_batch(batch_id).await {
                    info!(
                        batch_id = %batch_id,
                        sent = batch.sent,
                        failed = batch.failed,
                        total = batch.total_recipients,
                        rate_used = rate.sent,
                        rate_limit = rate.limit,
                        "Campaign progress"
                    );
                }
            }
        });

        let outcome = handle
            .wait()
            .await
            .context("Batch worker failed")?;

        signal_task.abort();
        progress_task.abort();

        record_batch_settled(outcome.status);

        // Final state, straight from the store
        let batch = store.get_batch(batch_id).await?;
        let attempts = store.list_attempts(batch_id).await?;
        let recent = store.list_recent_attempts(config.recent).await?;
        let rate = reporter.current();
        record_rate_snapshot(rate.sent, rate.limit, rate.reset_in);

        let mut stats = CampaignStats::new(batch, rate, start_time.elapsed());
        for attempt in &attempts {
            stats.aggregator.update(attempt);
        }
        stats.recent_attempts = recent;

        info!(
            batch_id = %batch_id,
            status = %stats.batch.status,
            sent = stats.batch.sent,
            failed = stats.batch.failed,
            duration_secs = stats.duration.as_secs_f64(),
            "Campaign finished"
        );

        Ok(stats)
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
