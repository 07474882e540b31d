//! Campaign orchestration - wires plan, recipients, and engine together.

mod orchestrator;
mod recipients;
mod stats;

pub use orchestrator::{Campaign, CampaignConfig};
pub use recipients::load_recipients;
pub use stats::CampaignStats;
