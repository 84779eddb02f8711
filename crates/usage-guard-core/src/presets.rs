//! Built-in rule presets.

use crate::policy::model::RuleRegistry;
use crate::policy::{load_registry_from_toml, LoadRulesError};

/// Rule sets selectable with `preset = "..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// The sample policies: no `System*` namespaces inside
    /// `Company.Product*`, no `ForbiddenType` inside `RestrictedClass`,
    /// and no `System.IO*` types inside `SensitiveMethod`.
    Sample,
}

const SAMPLE: &str = r#"
[[namespace-rule]]
name = "no-system-in-product"
outer = "Company.Product"
forbidden = "System"

[[usage-rule]]
name = "no-forbidden-type-in-restricted-class"
category = "type"
context = { declaring-type = "RestrictedClass" }
used = { name = "ForbiddenType" }

[[usage-rule]]
name = "no-io-in-sensitive-method"
category = "type"
context = { name = "SensitiveMethod" }
used = { namespace-prefix = "System.IO" }
"#;

impl Preset {
    /// All presets.
    pub const ALL: [Self; 1] = [Self::Sample];

    /// Parses a preset name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Names of all presets.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|p| p.name()).collect()
    }

    /// The configuration name of this preset.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sample => "sample",
        }
    }

    /// The preset's rule tables as TOML.
    #[must_use]
    pub fn toml(self) -> &'static str {
        match self {
            Self::Sample => SAMPLE,
        }
    }

    /// Builds the preset's registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded rules fail validation.
    pub fn registry(self) -> Result<RuleRegistry, LoadRulesError> {
        load_registry_from_toml(self.toml())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_rules() {
        let registry = Preset::Sample.registry().unwrap();
        assert_eq!(registry.namespace_rules().len(), 1);
        assert_eq!(registry.usage_rules().len(), 2);
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(Preset::parse("sample"), Some(Preset::Sample));
        assert_eq!(Preset::parse("recommended"), None);
        assert_eq!(Preset::names(), ["sample"]);
    }
}
