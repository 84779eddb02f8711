//! DTO → Domain model conversion with validation.

use crate::types::Severity;

use super::config_dto::{
    ContextMatcherDto, DescriptorDto, NamespaceRuleDto, PolicyConfigDto, UsageRuleDto,
    UsedMatcherDto,
};
use super::model::{
    ContextMatcher, Descriptor, ModelError, NamespaceRule, RuleCategory, RuleRegistry, UsageRule,
    UsedMatcher,
};

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "usage-rule[0].message").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// A matcher table sets more than one key.
    #[error("{context}: matcher must set at most one of {keys}")]
    AmbiguousMatcher {
        /// Where the error occurred.
        context: String,
        /// Accepted keys.
        keys: &'static str,
    },

    /// Unknown category string.
    #[error("{context}: unknown category `{value}`, expected: type, generic, delegate, attribute")]
    UnknownCategory {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// Unknown severity string.
    #[error("{context}: unknown severity `{value}`, expected: error, warning, info")]
    UnknownSeverity {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// Cross-reference errors from aggregate root construction.
    #[error("configuration validation errors:\n{}", format_errors(.0))]
    CrossRef(Vec<ModelError>),
}

fn format_errors(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts a `PolicyConfigDto` to a validated `RuleRegistry`.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: PolicyConfigDto) -> Result<RuleRegistry, LoadError> {
    let namespace_rules = dto
        .namespace_rules
        .into_iter()
        .enumerate()
        .map(|(i, r)| convert_namespace_rule(r, i))
        .collect::<Result<Vec<_>, _>>()?;

    let usage_rules = dto
        .usage_rules
        .into_iter()
        .enumerate()
        .map(|(i, r)| convert_usage_rule(r, i))
        .collect::<Result<Vec<_>, _>>()?;

    RuleRegistry::new(namespace_rules, usage_rules).map_err(LoadError::CrossRef)
}

fn validation(context: String) -> impl FnOnce(ModelError) -> LoadError {
    move |source| LoadError::Validation { context, source }
}

fn convert_namespace_rule(dto: NamespaceRuleDto, index: usize) -> Result<NamespaceRule, LoadError> {
    let ctx = format!("namespace-rule[{index}]");
    let descriptor = convert_descriptor(dto.descriptor, RuleCategory::Namespace, &ctx)?;
    let rule = NamespaceRule::new(dto.name, dto.outer, dto.forbidden).map_err(validation(ctx))?;
    Ok(rule.with_descriptor(descriptor))
}

fn convert_usage_rule(dto: UsageRuleDto, index: usize) -> Result<UsageRule, LoadError> {
    let ctx = format!("usage-rule[{index}]");
    let category = match RuleCategory::parse(&dto.category) {
        Some(RuleCategory::Namespace) | None => {
            return Err(LoadError::UnknownCategory {
                context: format!("{ctx}.category"),
                value: dto.category,
            })
        }
        Some(category) => category,
    };
    let context = convert_context(dto.context, &ctx)?;
    let used = convert_used(dto.used, &ctx)?;
    let descriptor = convert_descriptor(dto.descriptor, category, &ctx)?;

    let mut rule =
        UsageRule::new(dto.name, category, context, used).map_err(validation(ctx.clone()))?;
    if let Some(sites) = dto.sites {
        rule = rule
            .with_sites(sites)
            .map_err(validation(format!("{ctx}.sites")))?;
    }
    Ok(rule.with_descriptor(descriptor))
}

fn convert_context(dto: ContextMatcherDto, ctx: &str) -> Result<ContextMatcher, LoadError> {
    match (dto.declaring_type, dto.name, dto.namespace_prefix) {
        (None, None, None) => Ok(ContextMatcher::Any),
        (Some(t), None, None) => Ok(ContextMatcher::DeclaringType(t)),
        (None, Some(n), None) => Ok(ContextMatcher::Name(n)),
        (None, None, Some(p)) => Ok(ContextMatcher::NamespacePrefix(p)),
        _ => Err(LoadError::AmbiguousMatcher {
            context: format!("{ctx}.context"),
            keys: "declaring-type, name, namespace-prefix",
        }),
    }
}

fn convert_used(dto: UsedMatcherDto, ctx: &str) -> Result<UsedMatcher, LoadError> {
    match (dto.name, dto.namespace_prefix) {
        (None, None) => Ok(UsedMatcher::Any),
        (Some(n), None) => Ok(UsedMatcher::Name(n)),
        (None, Some(p)) => Ok(UsedMatcher::NamespacePrefix(p)),
        (Some(_), Some(_)) => Err(LoadError::AmbiguousMatcher {
            context: format!("{ctx}.used"),
            keys: "name, namespace-prefix",
        }),
    }
}

fn convert_descriptor(
    dto: DescriptorDto,
    category: RuleCategory,
    ctx: &str,
) -> Result<Descriptor, LoadError> {
    let mut descriptor = Descriptor::for_category(category);
    if let Some(id) = dto.id {
        if id.trim().is_empty() {
            return Err(LoadError::Validation {
                context: format!("{ctx}.id"),
                source: ModelError::EmptyValue { field: "id" },
            });
        }
        descriptor = descriptor.with_id(id);
    }
    if let Some(message) = dto.message {
        descriptor = descriptor
            .with_template(message)
            .map_err(validation(format!("{ctx}.message")))?;
    }
    if let Some(severity) = dto.severity {
        descriptor = descriptor.with_severity(parse_severity(&severity, ctx)?);
    }
    if let Some(doc) = dto.doc {
        descriptor = descriptor.with_doc_ref(doc);
    }
    Ok(descriptor)
}

fn parse_severity(value: &str, context: &str) -> Result<Severity, LoadError> {
    Severity::parse(value).ok_or_else(|| LoadError::UnknownSeverity {
        context: context.to_string(),
        value: value.to_string(),
    })
}
