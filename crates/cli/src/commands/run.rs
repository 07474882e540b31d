//! `run` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::TemplateSpec;
use tracing::info;

use crate::campaign::{load_recipients, Campaign, CampaignConfig};
use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_campaign(args: &RunArgs) -> Result<()> {
    info!(plan = %args.plan.display(), "Loading dispatch plan");

    // Validate plan path
    if !args.plan.exists() {
        anyhow::bail!("Plan file not found: {}", args.plan.display());
    }

    // Load and parse the plan
    let mut plan = config_loader::ConfigLoader::load_from_path(&args.plan)
        .with_context(|| format!("Failed to load plan from {}", args.plan.display()))?;

    // Apply CLI overrides
    if let Some(limit) = args.hourly_limit {
        info!(limit, "Overriding hourly limit from CLI");
        plan.engine.hourly_limit = limit;
    }

    let template = resolve_template_arg(args)?;
    let variables = parse_variables(&args.vars)?;
    let filters = args
        .filters
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("Invalid --filters JSON")?;

    let recipients = load_recipients(&args.recipients)?;

    info!(
        hourly_limit = plan.engine.hourly_limit,
        templates = plan.templates.len(),
        recipients = recipients.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - plan and recipients are valid, exiting");
        print_campaign_summary(&plan, &recipients, &template);
        return Ok(());
    }

    let config = CampaignConfig {
        plan,
        recipients,
        template,
        variables,
        filters,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        recent: args.recent,
    };

    info!("Starting campaign...");
    let stats = Campaign::new(config).run().await?;

    stats.print_summary();
    info!("zapcentral finished");
    Ok(())
}

/// Map --template-id / --message onto a template spec
fn resolve_template_arg(args: &RunArgs) -> Result<TemplateSpec> {
    match (&args.template_id, &args.message) {
        (Some(id), None) => Ok(TemplateSpec::template(id)),
        (None, Some(body)) => Ok(TemplateSpec::inline(body)),
        (None, None) => anyhow::bail!("Provide either --template-id or --message"),
        (Some(_), Some(_)) => unreachable!("clap conflicts_with prevents this"),
    }
}

/// Parse repeated KEY=VALUE --var arguments
fn parse_variables(raw: &[String]) -> Result<HashMap<String, String>, CliError> {
    let mut variables = HashMap::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| CliError::InvalidVariable { raw: entry.clone() })?;
        if key.is_empty() {
            return Err(CliError::InvalidVariable { raw: entry.clone() });
        }
        variables.insert(key.to_string(), value.to_string());
    }
    Ok(variables)
}

/// Print campaign summary for dry-run mode
fn print_campaign_summary(
    plan: &contracts::DispatchPlan,
    recipients: &[contracts::Recipient],
    template: &TemplateSpec,
) {
    println!("\n=== Campaign Summary ===\n");
    println!("Engine:");
    println!("  Hourly limit: {}", plan.engine.hourly_limit);
    println!(
        "  Jitter: {}ms - {}ms",
        plan.engine.jitter.min_ms, plan.engine.jitter.max_ms
    );

    match template {
        TemplateSpec::Template { id } => {
            println!("\nTemplate: {}", id);
            if let Some(t) = plan.find_template(id) {
                println!("  Name: {}", t.name);
                println!("  Body: {}", t.body);
            } else {
                println!("  ⚠ not found in plan - dispatch would be rejected");
            }
        }
        TemplateSpec::Inline { body } => {
            println!("\nInline message:");
            println!("  {}", body);
        }
    }

    println!("\nRecipients ({}):", recipients.len());
    for recipient in recipients.iter().take(5) {
        println!("  - {} ({})", recipient.name, recipient.whatsapp);
    }
    if recipients.len() > 5 {
        println!("  ... and {} more", recipients.len() - 5);
    }

    println!();
}
