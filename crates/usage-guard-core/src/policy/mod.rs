//! Restriction rules driven by TOML configuration.
//!
//! # Architecture
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! config_dto types
//!   ↓ validate + convert
//! RuleRegistry (pure domain model)
//!   ↓ PolicyEngine::evaluate()
//! Findings
//! ```

pub mod config_dto;
pub mod engine;
pub mod loader;
pub mod model;

use crate::config::Config;
use crate::presets::Preset;
use model::RuleRegistry;

/// Errors from parsing TOML and loading rules.
#[derive(Debug, thiserror::Error)]
pub enum LoadRulesError {
    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Domain model validation failed.
    #[error("{0}")]
    Load(#[from] loader::LoadError),

    /// The configured preset name is not known.
    #[error("unknown preset `{0}`, expected: {expected}", expected = Preset::names().join(", "))]
    UnknownPreset(String),
}

/// Parses TOML content into a rule registry.
///
/// Only the rule tables are read; an empty document yields an empty registry.
///
/// # Errors
///
/// Returns an error if TOML parsing or model validation fails.
pub fn load_registry_from_toml(content: &str) -> Result<RuleRegistry, LoadRulesError> {
    let dto: config_dto::PolicyConfigDto = toml::from_str(content)?;
    Ok(loader::load(dto)?)
}

/// Builds the full registry for a configuration document.
///
/// Preset rules come first, followed by the document's own rules.
///
/// # Errors
///
/// Returns an error if parsing fails, the preset is unknown, or a
/// configured rule name collides with a preset rule.
pub fn registry_for_config(config: &Config, content: &str) -> Result<RuleRegistry, LoadRulesError> {
    let own = load_registry_from_toml(content)?;
    let Some(name) = config.preset.as_deref() else {
        return Ok(own);
    };
    let preset = Preset::parse(name).ok_or_else(|| LoadRulesError::UnknownPreset(name.to_string()))?;
    preset
        .registry()?
        .merge(own)
        .map_err(|errors| loader::LoadError::CrossRef(errors).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_rules_come_first() {
        let content = r#"
preset = "sample"

[[namespace-rule]]
name = "no-microsoft-in-core"
outer = "Company.Core"
forbidden = "Microsoft"
"#;
        let config = Config::parse(content).unwrap();
        let registry = registry_for_config(&config, content).unwrap();
        let names: Vec<&str> = registry
            .namespace_rules()
            .iter()
            .map(model::NamespaceRule::name)
            .collect();
        assert_eq!(names.last(), Some(&"no-microsoft-in-core"));
        assert!(names.len() > 1);
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let content = "preset = \"strict\"";
        let config = Config::parse(content).unwrap();
        let err = registry_for_config(&config, content).unwrap_err();
        assert!(matches!(err, LoadRulesError::UnknownPreset(ref p) if p == "strict"));
    }

    #[test]
    fn no_preset_means_only_own_rules() {
        let registry = registry_for_config(&Config::default(), "").unwrap();
        assert!(registry.is_empty());
    }
}
