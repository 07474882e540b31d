//! # Renderer
//!
//! Pure `{{variable}}` substitution for message bodies.
//!
//! Unknown keys are left verbatim (fail-open) so a typo in a template
//! never blocks a campaign; the operator sees the literal token in the
//! delivered text and in the audit record. The renderer never reads the
//! clock; `{{data}}` is supplied by the caller like any other variable.

use std::collections::HashMap;

use contracts::Recipient;

/// Replace every `{{key}}` occurrence in `body` with `vars[key]`.
///
/// Deterministic and side-effect free; safe to call concurrently and
/// repeatedly. A `{{` without a closing `}}` is copied through unchanged.
pub fn render(body: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find("}}") {
            Some(end) => {
                let key = &after_open[..end];
                match vars.get(key.trim()) {
                    Some(value) => out.push_str(value),
                    // Unknown key: keep the literal token
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[end + 2..];
            }
            // Unterminated placeholder: copy the remainder as-is
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Build the variable map for one recipient: per-recipient fields first,
/// then batch-level variables, which win on key collision.
///
/// `today` is the caller-formatted current date for `{{data}}`.
pub fn recipient_vars(
    recipient: &Recipient,
    batch_vars: &HashMap<String, String>,
    today: &str,
) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("nome".to_string(), recipient.name.clone());
    if let Some(plan) = &recipient.plan {
        vars.insert("plano".to_string(), plan.clone());
    }
    if let Some(email) = &recipient.email {
        vars.insert("email".to_string(), email.clone());
    }
    vars.insert("data".to_string(), today.to_string());

    for (k, v) in batch_vars {
        vars.insert(k.clone(), v.clone());
    }

    vars
}
