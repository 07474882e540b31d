//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// zapcentral - Bulk WhatsApp dispatch console
#[derive(Parser, Debug)]
#[command(
    name = "zapcentral",
    author,
    version,
    about = "Bulk WhatsApp dispatch console",
    long_about = "The dispatch backend of the Central de Comunicações.\n\n\
                  Loads a dispatch plan and a recipient list, sends a templated \n\
                  message to every recipient under the provider's hourly ceiling \n\
                  with randomized pacing, and reports every attempt."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ZAPCENTRAL_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ZAPCENTRAL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch a campaign to a recipient list
    Run(RunArgs),

    /// Validate a plan file without sending anything
    Validate(ValidateArgs),

    /// Display plan information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to the dispatch plan (TOML or JSON)
    #[arg(short, long, default_value = "plan.toml", env = "ZAPCENTRAL_PLAN")]
    pub plan: PathBuf,

    /// Path to the recipient list (JSON array)
    #[arg(short, long, env = "ZAPCENTRAL_RECIPIENTS")]
    pub recipients: PathBuf,

    /// Send a named template from the plan
    #[arg(long, conflicts_with = "message")]
    pub template_id: Option<String>,

    /// Send an inline message body instead of a template
    #[arg(long)]
    pub message: Option<String>,

    /// Batch-level template variable, key=value (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Opaque JSON snapshot of the filters that produced the list (audit)
    #[arg(long)]
    pub filters: Option<String>,

    /// Override the plan's hourly send ceiling
    #[arg(long, env = "ZAPCENTRAL_HOURLY_LIMIT")]
    pub hourly_limit: Option<usize>,

    /// Validate plan and recipients, print the summary, send nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ZAPCENTRAL_METRICS_PORT")]
    pub metrics_port: u16,

    /// How many recent attempts to print in the final summary
    #[arg(long, default_value = "10")]
    pub recent: usize,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the plan file to validate
    #[arg(short, long, default_value = "plan.toml")]
    pub plan: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to the plan file
    #[arg(short, long, default_value = "plan.toml")]
    pub plan: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show full template bodies
    #[arg(long)]
    pub templates: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
