//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON plan files
//! - Validate plan legality
//! - Produce a `DispatchPlan`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let plan = ConfigLoader::load_from_path(Path::new("plan.toml")).unwrap();
//! println!("Hourly limit: {}", plan.engine.hourly_limit);
//! ```

mod parser;
mod validator;

pub use contracts::DispatchPlan;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Plan loader
///
/// Provides static methods to load a plan from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a plan from a file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DispatchPlan, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a plan from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DispatchPlan, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize a DispatchPlan to a TOML string
    pub fn to_toml(plan: &DispatchPlan) -> Result<String, ContractError> {
        toml::to_string_pretty(plan)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a DispatchPlan to a JSON string
    pub fn to_json(plan: &DispatchPlan) -> Result<String, ContractError> {
        serde_json::to_string_pretty(plan)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read plan file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate plan content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DispatchPlan, ContractError> {
        let plan = parser::parse(content, format)?;
        validator::validate(&plan)?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SenderConfig;

    const MINIMAL_TOML: &str = r#"
[engine]
hourly_limit = 50

[engine.jitter]
min_ms = 1000
max_ms = 3000

[sender]
kind = "log"

[[templates]]
id = "boas_vindas"
name = "Boas-vindas"
body = "Olá {{nome}}, bem-vindo! Seu plano: {{plano}}"

[[templates]]
id = "lembrete_consulta"
name = "Lembrete de consulta"
body = "Olá {{nome}}, sua consulta é em {{data}}."
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let plan = result.unwrap();
        assert_eq!(plan.engine.hourly_limit, 50);
        assert_eq!(plan.templates.len(), 2);
        assert!(plan.find_template("lembrete_consulta").is_some());
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        // An empty plan is legal: defaults carry it
        let plan = ConfigLoader::load_from_str("", ConfigFormat::Toml).unwrap();
        assert_eq!(plan.engine.hourly_limit, 100);
        assert_eq!(plan.engine.jitter.min_ms, 5_000);
        assert_eq!(plan.engine.jitter.max_ms, 15_000);
        assert!(matches!(plan.sender, SenderConfig::Log));
        assert!(plan.templates.is_empty());
    }

    #[test]
    fn test_round_trip_toml() {
        let plan = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&plan).unwrap();
        let plan2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(plan.engine.hourly_limit, plan2.engine.hourly_limit);
        assert_eq!(plan.templates.len(), plan2.templates.len());
        assert_eq!(plan.templates[0].id, plan2.templates[0].id);
    }

    #[test]
    fn test_round_trip_json() {
        let plan = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&plan).unwrap();
        let plan2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(plan.engine.hourly_limit, plan2.engine.hourly_limit);
    }

    #[test]
    fn test_http_sender_config() {
        let content = r#"
[sender]
kind = "http"
url = "https://gateway.exemplo.com/message/send"
token = "s3cret"
"#;
        let plan = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        match plan.sender {
            SenderConfig::Http { url, token, timeout_ms } => {
                assert_eq!(url, "https://gateway.exemplo.com/message/send");
                assert_eq!(token.as_deref(), Some("s3cret"));
                assert_eq!(timeout_ms, 30_000);
            }
            SenderConfig::Log => panic!("expected http sender"),
        }
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // Duplicate template id should fail validation
        let content = r#"
[[templates]]
id = "dup"
name = "A"
body = "a"

[[templates]]
id = "dup"
name = "B"
body = "b"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }
}
