//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use serde::Deserialize;

use crate::site::UsageKind;

/// Raw TOML representation of the rule tables.
///
/// Read from the same document as [`crate::config::Config`], which ignores
/// these sections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfigDto {
    /// Namespace-containment rules.
    #[serde(rename = "namespace-rule", default)]
    pub namespace_rules: Vec<NamespaceRuleDto>,

    /// Symbol usage rules.
    #[serde(rename = "usage-rule", default)]
    pub usage_rules: Vec<UsageRuleDto>,
}

/// Diagnostic overrides shared by both rule tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptorDto {
    /// Diagnostic id override (default: the category id).
    #[serde(default)]
    pub id: Option<String>,
    /// Message template override with `{0}` (used) and `{1}` (context).
    #[serde(default)]
    pub message: Option<String>,
    /// Severity (default: "error").
    #[serde(default)]
    pub severity: Option<String>,
    /// Document reference.
    #[serde(default)]
    pub doc: Option<String>,
}

/// TOML representation of a namespace rule.
#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceRuleDto {
    /// Rule name (e.g., "no-system-in-product").
    pub name: String,
    /// Enclosing namespace prefix.
    pub outer: String,
    /// Forbidden namespace prefix.
    pub forbidden: String,
    /// Diagnostic overrides.
    #[serde(flatten)]
    pub descriptor: DescriptorDto,
}

/// TOML representation of a usage rule.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageRuleDto {
    /// Rule name (e.g., "no-forbidden-type-in-restricted").
    pub name: String,
    /// Category name: type, generic, delegate, attribute.
    pub category: String,
    /// Context matcher table; omitted or empty matches any context.
    #[serde(default)]
    pub context: ContextMatcherDto,
    /// Used-symbol matcher table; omitted or empty matches anything.
    #[serde(default)]
    pub used: UsedMatcherDto,
    /// Usage kinds the rule applies to (default: from the category).
    #[serde(default)]
    pub sites: Option<Vec<UsageKind>>,
    /// Diagnostic overrides.
    #[serde(flatten)]
    pub descriptor: DescriptorDto,
}

/// `context = { declaring-type = "..." }` and friends. At most one key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ContextMatcherDto {
    /// Simple name of the context's declaring type.
    #[serde(default)]
    pub declaring_type: Option<String>,
    /// Simple name of the context itself.
    #[serde(default)]
    pub name: Option<String>,
    /// Prefix of the context's namespace.
    #[serde(default)]
    pub namespace_prefix: Option<String>,
}

/// `used = { name = "..." }` and friends. At most one key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct UsedMatcherDto {
    /// Simple name of the used symbol.
    #[serde(default)]
    pub name: Option<String>,
    /// Prefix of the used symbol's namespace.
    #[serde(default)]
    pub namespace_prefix: Option<String>,
}
