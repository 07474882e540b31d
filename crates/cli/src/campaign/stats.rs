//! Campaign statistics and final summary printing.

use std::time::Duration;

use contracts::{AttemptStatus, Batch, DeliveryAttempt};
use observability::DispatchMetricsAggregator;
use rate_limiter::RateSnapshot;

/// Statistics from a campaign run
#[derive(Debug, Clone)]
pub struct CampaignStats {
    /// Final batch record
    pub batch: Batch,

    /// Rate window state at the end of the run
    pub rate: RateSnapshot,

    /// Wall-clock duration of the campaign
    pub duration: Duration,

    /// Attempt metrics aggregator
    pub aggregator: DispatchMetricsAggregator,

    /// Most recent individual attempts, newest first
    pub recent_attempts: Vec<DeliveryAttempt>,
}

impl CampaignStats {
    pub fn new(batch: Batch, rate: RateSnapshot, duration: Duration) -> Self {
        Self {
            batch,
            rate,
            duration,
            aggregator: DispatchMetricsAggregator::new(),
            recent_attempts: Vec::new(),
        }
    }

    /// Messages attempted per minute over the whole run
    pub fn throughput_per_minute(&self) -> f64 {
        let attempted = (self.batch.sent + self.batch.failed) as f64;
        if self.duration.as_secs_f64() > 0.0 {
            attempted / (self.duration.as_secs_f64() / 60.0)
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Campaign Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Batch: {}", self.batch.id);
        println!("   ├─ Status: {}", self.batch.status);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Recipients: {}", self.batch.total_recipients);
        println!("   ├─ Sent: {}", self.batch.sent);
        println!("   ├─ Failed: {}", self.batch.failed);
        println!("   └─ Throughput: {:.2} msg/min", self.throughput_per_minute());

        if self.batch.audit_degraded {
            println!("\n⚠️  Audit trail incomplete: some attempt records were lost");
        }

        println!("\n⏱  Rate Window");
        println!(
            "   ├─ Used: {}/{} this hour",
            self.rate.sent, self.rate.limit
        );
        println!(
            "   └─ Resets in: {}m{:02}s",
            self.rate.reset_in.as_secs() / 60,
            self.rate.reset_in.as_secs() % 60
        );

        println!("\n📈 {}", self.aggregator.summary());

        if !self.recent_attempts.is_empty() {
            println!("📬 Recent Attempts");
            for (i, attempt) in self.recent_attempts.iter().enumerate() {
                let is_last = i == self.recent_attempts.len() - 1;
                let prefix = if is_last { "└─" } else { "├─" };
                let icon = match attempt.status {
                    AttemptStatus::Sent => "✅",
                    AttemptStatus::Failed => "❌",
                    AttemptStatus::Pending => "⏳",
                };
                let detail = attempt
                    .failure
                    .as_ref()
                    .map(|f| format!(" [{}]", f))
                    .unwrap_or_default();
                println!(
                    "   {} {} {} ({}){}",
                    prefix, icon, attempt.recipient_name, attempt.whatsapp, detail
                );
            }
        }

        println!();
    }
}
