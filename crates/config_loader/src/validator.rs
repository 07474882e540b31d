//! Plan validation
//!
//! Rules:
//! - hourly_limit > 0
//! - jitter min_ms <= max_ms
//! - persist_retry max_attempts >= 1
//! - template ids unique and non-empty, bodies non-empty
//! - http sender has a usable URL

use std::collections::HashSet;

use contracts::{ContractError, DispatchPlan, SenderConfig};

/// Validate a DispatchPlan
///
/// Returns the first encountered error, or Ok(()).
pub fn validate(plan: &DispatchPlan) -> Result<(), ContractError> {
    validate_engine(plan)?;
    validate_templates(plan)?;
    validate_sender(plan)?;
    Ok(())
}

fn validate_engine(plan: &DispatchPlan) -> Result<(), ContractError> {
    let engine = &plan.engine;

    if engine.hourly_limit == 0 {
        return Err(ContractError::config_validation(
            "engine.hourly_limit",
            "hourly_limit must be > 0",
        ));
    }

    if engine.jitter.min_ms > engine.jitter.max_ms {
        return Err(ContractError::config_validation(
            "engine.jitter",
            format!(
                "min_ms ({}) must be <= max_ms ({})",
                engine.jitter.min_ms, engine.jitter.max_ms
            ),
        ));
    }

    if engine.persist_retry.max_attempts == 0 {
        return Err(ContractError::config_validation(
            "engine.persist_retry.max_attempts",
            "max_attempts must be >= 1",
        ));
    }

    Ok(())
}

fn validate_templates(plan: &DispatchPlan) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, template) in plan.templates.iter().enumerate() {
        if template.id.is_empty() {
            return Err(ContractError::config_validation(
                format!("templates[{idx}].id"),
                "template id cannot be empty",
            ));
        }
        if !seen.insert(&template.id) {
            return Err(ContractError::config_validation(
                format!("templates[id={}]", template.id),
                "duplicate template id",
            ));
        }
        if template.body.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("templates[id={}].body", template.id),
                "template body cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_sender(plan: &DispatchPlan) -> Result<(), ContractError> {
    if let SenderConfig::Http { url, timeout_ms, .. } = &plan.sender {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ContractError::config_validation(
                "sender.url",
                format!("not an http(s) URL: '{url}'"),
            ));
        }
        if *timeout_ms == 0 {
            return Err(ContractError::config_validation(
                "sender.timeout_ms",
                "timeout_ms must be > 0",
            ));
        }
    }
    Ok(())
}
