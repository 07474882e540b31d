//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    plan_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<PlanSummary>,
}

#[derive(Serialize)]
struct PlanSummary {
    version: String,
    hourly_limit: usize,
    jitter_min_ms: u64,
    jitter_max_ms: u64,
    sender: String,
    template_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(plan = %args.plan.display(), "Validating plan");

    let result = validate_plan(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Plan validation failed")
    }
}

fn validate_plan(args: &ValidateArgs) -> ValidationResult {
    let plan_path = args.plan.display().to_string();

    // Check file exists
    if !args.plan.exists() {
        return ValidationResult {
            valid: false,
            plan_path,
            error: Some(format!("File not found: {}", args.plan.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.plan) {
        Ok(plan) => {
            let warnings = collect_warnings(&plan);

            ValidationResult {
                valid: true,
                plan_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(PlanSummary {
                    version: format!("{:?}", plan.version),
                    hourly_limit: plan.engine.hourly_limit,
                    jitter_min_ms: plan.engine.jitter.min_ms,
                    jitter_max_ms: plan.engine.jitter.max_ms,
                    sender: sender_label(&plan),
                    template_count: plan.templates.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            plan_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect plan warnings (non-fatal issues)
fn collect_warnings(plan: &contracts::DispatchPlan) -> Vec<String> {
    let mut warnings = Vec::new();

    if plan.templates.is_empty() {
        warnings.push("No templates defined - only --message dispatches will work".to_string());
    }

    if plan.engine.jitter.max_ms == 0 {
        warnings.push(
            "Jitter disabled - the provider may throttle or ban unpaced bulk traffic".to_string(),
        );
    }

    if matches!(plan.sender, contracts::SenderConfig::Log) {
        warnings.push("Log sender configured - messages will not actually be sent".to_string());
    }

    for template in &plan.templates {
        if !template.body.contains("{{") {
            warnings.push(format!(
                "Template '{}' has no variables - every recipient gets identical text",
                template.id
            ));
        }
    }

    warnings
}

fn sender_label(plan: &contracts::DispatchPlan) -> String {
    match &plan.sender {
        contracts::SenderConfig::Log => "log".to_string(),
        contracts::SenderConfig::Http { url, .. } => format!("http ({url})"),
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Plan is valid: {}", result.plan_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Hourly limit: {}", summary.hourly_limit);
            println!(
                "  Jitter: {}ms - {}ms",
                summary.jitter_min_ms, summary.jitter_max_ms
            );
            println!("  Sender: {}", summary.sender);
            println!("  Templates: {}", summary.template_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Plan is invalid: {}", result.plan_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
