//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Plan info for JSON output
#[derive(Serialize)]
struct PlanInfo {
    version: String,
    engine: EngineInfo,
    sender: SenderInfo,
    templates: Vec<TemplateInfo>,
}

#[derive(Serialize)]
struct EngineInfo {
    hourly_limit: usize,
    jitter_min_ms: u64,
    jitter_max_ms: u64,
    persist_retry_attempts: u32,
}

#[derive(Serialize)]
struct SenderInfo {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
}

#[derive(Serialize)]
struct TemplateInfo {
    id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(plan = %args.plan.display(), "Loading plan info");

    if !args.plan.exists() {
        anyhow::bail!("Plan file not found: {}", args.plan.display());
    }

    let plan = config_loader::ConfigLoader::load_from_path(&args.plan)
        .with_context(|| format!("Failed to load plan from {}", args.plan.display()))?;

    if args.json {
        let info = build_plan_info(&plan, args);
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize plan info")?;
        println!("{}", json);
    } else {
        print_plan_info(&plan, args);
    }

    Ok(())
}

fn build_plan_info(plan: &contracts::DispatchPlan, args: &InfoArgs) -> PlanInfo {
    let sender = match &plan.sender {
        contracts::SenderConfig::Log => SenderInfo {
            kind: "log".to_string(),
            url: None,
            timeout_ms: None,
        },
        contracts::SenderConfig::Http {
            url, timeout_ms, ..
        } => SenderInfo {
            kind: "http".to_string(),
            url: Some(url.clone()),
            timeout_ms: Some(*timeout_ms),
        },
    };

    let templates = plan
        .templates
        .iter()
        .map(|t| TemplateInfo {
            id: t.id.clone(),
            name: t.name.clone(),
            body: args.templates.then(|| t.body.clone()),
        })
        .collect();

    PlanInfo {
        version: format!("{:?}", plan.version),
        engine: EngineInfo {
            hourly_limit: plan.engine.hourly_limit,
            jitter_min_ms: plan.engine.jitter.min_ms,
            jitter_max_ms: plan.engine.jitter.max_ms,
            persist_retry_attempts: plan.engine.persist_retry.max_attempts,
        },
        sender,
        templates,
    }
}

fn print_plan_info(plan: &contracts::DispatchPlan, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 zapcentral Dispatch Plan                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Engine settings
    println!("⚙️  Engine");
    println!("   ├─ Version: {:?}", plan.version);
    println!("   ├─ Hourly limit: {} messages", plan.engine.hourly_limit);
    println!(
        "   ├─ Jitter: {}ms - {}ms between messages",
        plan.engine.jitter.min_ms, plan.engine.jitter.max_ms
    );
    println!(
        "   └─ Persist retry: {} attempts, {}ms backoff",
        plan.engine.persist_retry.max_attempts, plan.engine.persist_retry.backoff_ms
    );

    // Sender
    println!("\n📤 Sender");
    match &plan.sender {
        contracts::SenderConfig::Log => {
            println!("   └─ log (dry-run; nothing leaves the process)");
        }
        contracts::SenderConfig::Http {
            url,
            token,
            timeout_ms,
        } => {
            println!("   ├─ http gateway: {}", url);
            println!(
                "   ├─ auth: {}",
                if token.is_some() {
                    "bearer token"
                } else {
                    "none"
                }
            );
            println!("   └─ timeout: {}ms", timeout_ms);
        }
    }

    // Templates
    println!("\n📝 Templates ({})", plan.templates.len());
    for (i, template) in plan.templates.iter().enumerate() {
        let is_last = i == plan.templates.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        println!("   {} {} ({})", prefix, template.id, template.name);

        if args.templates {
            let child_prefix = if is_last { "   " } else { "│  " };
            println!("   {}     {}", child_prefix, template.body);
        }
    }

    println!();
}
