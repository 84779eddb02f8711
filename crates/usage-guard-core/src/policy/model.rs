//! Pure domain model for restriction rules.
//!
//! No serde, no I/O. Invariants are enforced at construction time and the
//! resulting [`RuleRegistry`] is immutable.

use std::collections::HashSet;
use std::fmt;

use crate::site::UsageKind;
use crate::symbol::{Symbol, SymbolId, SymbolKind, SymbolModel};
use crate::types::Severity;

/// Errors raised while constructing rule model values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Rule names must be non-empty.
    #[error("rule name must not be empty")]
    EmptyRuleName,

    /// A matcher or prefix value is empty.
    #[error("`{field}` must not be empty")]
    EmptyValue {
        /// Which field was empty.
        field: &'static str,
    },

    /// A message template lacks a format slot.
    #[error("message template `{template}` must contain `{{0}}` and `{{1}}`")]
    InvalidTemplate {
        /// The rejected template.
        template: String,
    },

    /// A usage rule lists no usage kinds to apply to.
    #[error("usage rule `{rule}` applies to no usage kinds")]
    NoSites {
        /// The rule name.
        rule: String,
    },

    /// A usage rule lists the namespace usage kind.
    #[error("usage rule `{rule}` cannot apply to namespace usages; use a namespace rule")]
    NamespaceSite {
        /// The rule name.
        rule: String,
    },

    /// Two rules share a name.
    #[error("duplicate rule name `{name}`")]
    DuplicateRuleName {
        /// The repeated name.
        name: String,
    },
}

// ────────────────────────────────────────────
// Categories and descriptors
// ────────────────────────────────────────────

/// Rule category; selects the default diagnostic descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// Namespace containment (NS001).
    Namespace,
    /// Type usage (TU001).
    Type,
    /// Generic type argument usage (GT001).
    Generic,
    /// Delegate usage (DL001).
    Delegate,
    /// Attribute usage (AT001).
    Attribute,
}

impl RuleCategory {
    /// All categories, in id order of the listing.
    pub const ALL: [Self; 5] = [
        Self::Namespace,
        Self::Type,
        Self::Generic,
        Self::Delegate,
        Self::Attribute,
    ];

    /// Parses a lowercase category name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == value)
    }

    /// Lowercase category name used in configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Type => "type",
            Self::Generic => "generic",
            Self::Delegate => "delegate",
            Self::Attribute => "attribute",
        }
    }

    /// Stable diagnostic id for the category.
    #[must_use]
    pub fn default_id(self) -> &'static str {
        match self {
            Self::Namespace => "NS001",
            Self::Type => "TU001",
            Self::Generic => "GT001",
            Self::Delegate => "DL001",
            Self::Attribute => "AT001",
        }
    }

    /// Short title shown by `list-rules`.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Namespace => "Namespace usage violation",
            Self::Type => "Type usage violation",
            Self::Generic => "Generic type violation",
            Self::Delegate => "Delegate usage violation",
            Self::Attribute => "Attribute usage violation",
        }
    }

    /// Default message template; `{0}` is the used name, `{1}` the context name.
    #[must_use]
    pub fn default_template(self) -> &'static str {
        match self {
            Self::Namespace => "Namespace '{0}' is not allowed in namespace '{1}'",
            Self::Type => "Usage of type '{0}' is not allowed in '{1}'",
            Self::Generic => "Usage of generic type '{0}' is not allowed in '{1}'",
            Self::Delegate => "Usage of delegate '{0}' is not allowed in '{1}'",
            Self::Attribute => "Usage of attribute '{0}' is not allowed in '{1}'",
        }
    }

    /// Usage kinds a usage rule of this category applies to by default.
    #[must_use]
    pub fn default_sites(self) -> &'static [UsageKind] {
        match self {
            Self::Namespace => &[UsageKind::Namespace],
            Self::Type => &UsageKind::SYMBOL_KINDS,
            Self::Generic => &[UsageKind::TypeArgument],
            Self::Delegate => &[UsageKind::Delegate],
            Self::Attribute => &[UsageKind::Attribute],
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a violation of a rule is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    id: String,
    severity: Severity,
    template: String,
    doc_ref: Option<String>,
}

impl Descriptor {
    /// The category's default descriptor at error severity.
    #[must_use]
    pub fn for_category(category: RuleCategory) -> Self {
        Self {
            id: category.default_id().to_string(),
            severity: Severity::Error,
            template: category.default_template().to_string(),
            doc_ref: None,
        }
    }

    /// Overrides the diagnostic id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Overrides the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Overrides the message template.
    ///
    /// # Errors
    ///
    /// Returns an error unless the template contains both `{0}` and `{1}`.
    pub fn with_template(mut self, template: impl Into<String>) -> Result<Self, ModelError> {
        let template = template.into();
        if !template.contains("{0}") || !template.contains("{1}") {
            return Err(ModelError::InvalidTemplate { template });
        }
        self.template = template;
        Ok(self)
    }

    /// Attaches a design document reference.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.doc_ref = Some(doc_ref.into());
        self
    }

    /// Returns the diagnostic id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the document reference.
    #[must_use]
    pub fn doc_ref(&self) -> Option<&str> {
        self.doc_ref.as_deref()
    }

    /// Fills the template slots with the used name and the context name.
    #[must_use]
    pub fn render(&self, used: &str, context: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + used.len() + context.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix("{0}") {
                out.push_str(used);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{1}") {
                out.push_str(context);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

// ────────────────────────────────────────────
// Namespace rules
// ────────────────────────────────────────────

/// Forbids namespaces under `forbidden_prefix` inside namespaces under `outer_prefix`.
#[derive(Debug, Clone)]
pub struct NamespaceRule {
    name: String,
    outer_prefix: String,
    forbidden_prefix: String,
    descriptor: Descriptor,
}

impl NamespaceRule {
    /// Creates a namespace rule with the default NS001 descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or either prefix is empty.
    pub fn new(
        name: impl Into<String>,
        outer_prefix: impl Into<String>,
        forbidden_prefix: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let name = non_empty_name(name.into())?;
        let outer_prefix = non_empty(outer_prefix.into(), "outer")?;
        let forbidden_prefix = non_empty(forbidden_prefix.into(), "forbidden")?;
        Ok(Self {
            name,
            outer_prefix,
            forbidden_prefix,
            descriptor: Descriptor::for_category(RuleCategory::Namespace),
        })
    }

    /// Replaces the descriptor.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the outer namespace prefix.
    #[must_use]
    pub fn outer_prefix(&self) -> &str {
        &self.outer_prefix
    }

    /// Returns the forbidden namespace prefix.
    #[must_use]
    pub fn forbidden_prefix(&self) -> &str {
        &self.forbidden_prefix
    }

    /// Returns the descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Tests whether `inner` used inside `outer` is forbidden by this rule.
    #[must_use]
    pub fn forbids(&self, outer: &str, inner: &str) -> bool {
        outer.starts_with(&self.outer_prefix) && inner.starts_with(&self.forbidden_prefix)
    }
}

// ────────────────────────────────────────────
// Usage rules
// ────────────────────────────────────────────

/// Predicate over the containing context symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextMatcher {
    /// Matches every context.
    Any,
    /// Context's declaring type has this simple name.
    DeclaringType(String),
    /// Context's own simple name (e.g., a method name).
    Name(String),
    /// Context's namespace starts with this prefix.
    NamespacePrefix(String),
}

impl ContextMatcher {
    /// Evaluates the predicate. Unresolvable data never matches.
    #[must_use]
    pub fn matches<M: SymbolModel + ?Sized>(&self, context: SymbolId, model: &M) -> bool {
        let Some(symbol) = model.symbol(context) else {
            return false;
        };
        match self {
            Self::Any => true,
            Self::DeclaringType(name) => model
                .containing_type(context)
                .and_then(|t| model.symbol(t))
                .is_some_and(|t| &t.name == name),
            Self::Name(name) => &symbol.name == name,
            Self::NamespacePrefix(prefix) => {
                namespace_of(symbol, model).is_some_and(|ns| ns.starts_with(prefix.as_str()))
            }
        }
    }
}

impl fmt::Display for ContextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any context"),
            Self::DeclaringType(n) => write!(f, "declared in type `{n}`"),
            Self::Name(n) => write!(f, "context named `{n}`"),
            Self::NamespacePrefix(p) => write!(f, "context in `{p}*`"),
        }
    }
}

/// Predicate over the used type or symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsedMatcher {
    /// Matches every used symbol.
    Any,
    /// Used symbol's simple name.
    Name(String),
    /// Used symbol's namespace starts with this prefix.
    NamespacePrefix(String),
}

impl UsedMatcher {
    /// Evaluates the predicate. Unresolvable data never matches.
    #[must_use]
    pub fn matches<M: SymbolModel + ?Sized>(&self, used: SymbolId, model: &M) -> bool {
        let Some(symbol) = model.symbol(used) else {
            return false;
        };
        match self {
            Self::Any => true,
            Self::Name(name) => &symbol.name == name,
            Self::NamespacePrefix(prefix) => {
                namespace_of(symbol, model).is_some_and(|ns| ns.starts_with(prefix.as_str()))
            }
        }
    }
}

impl fmt::Display for UsedMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "anything"),
            Self::Name(n) => write!(f, "`{n}`"),
            Self::NamespacePrefix(p) => write!(f, "`{p}*`"),
        }
    }
}

/// The namespace a symbol lives in.
///
/// Members without their own namespace inherit their declaring type's.
fn namespace_of<'m, M: SymbolModel + ?Sized>(symbol: &'m Symbol, model: &'m M) -> Option<&'m str> {
    match &symbol.kind {
        SymbolKind::Namespace | SymbolKind::Type { .. } | SymbolKind::Delegate { .. } => {
            symbol.containing_namespace.as_deref()
        }
        SymbolKind::Method { .. }
        | SymbolKind::Property { .. }
        | SymbolKind::Field { .. }
        | SymbolKind::Attribute
        | SymbolKind::Parameter { .. } => symbol.containing_namespace.as_deref().or_else(|| {
            symbol
                .containing_type
                .and_then(|t| model.symbol(t))
                .and_then(|t| t.containing_namespace.as_deref())
        }),
    }
}

/// Forbids used symbols matching `used` inside contexts matching `context`.
#[derive(Debug, Clone)]
pub struct UsageRule {
    name: String,
    category: RuleCategory,
    context: ContextMatcher,
    used: UsedMatcher,
    sites: Vec<UsageKind>,
    descriptor: Descriptor,
}

impl UsageRule {
    /// Creates a usage rule with the category's default descriptor and sites.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, the category is
    /// [`RuleCategory::Namespace`], or a matcher value is empty.
    pub fn new(
        name: impl Into<String>,
        category: RuleCategory,
        context: ContextMatcher,
        used: UsedMatcher,
    ) -> Result<Self, ModelError> {
        let name = non_empty_name(name.into())?;
        if category == RuleCategory::Namespace {
            return Err(ModelError::NamespaceSite { rule: name });
        }
        validate_context(&context)?;
        validate_used(&used)?;
        Ok(Self {
            name,
            category,
            context,
            used,
            sites: category.default_sites().to_vec(),
            descriptor: Descriptor::for_category(category),
        })
    }

    /// Restricts the usage kinds this rule applies to.
    ///
    /// # Errors
    ///
    /// Returns an error if `sites` is empty or contains [`UsageKind::Namespace`].
    pub fn with_sites(mut self, sites: Vec<UsageKind>) -> Result<Self, ModelError> {
        if sites.is_empty() {
            return Err(ModelError::NoSites { rule: self.name });
        }
        if sites.iter().any(|k| k.is_namespace()) {
            return Err(ModelError::NamespaceSite { rule: self.name });
        }
        self.sites = sites;
        Ok(self)
    }

    /// Replaces the descriptor.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rule category.
    #[must_use]
    pub fn category(&self) -> RuleCategory {
        self.category
    }

    /// Returns the context matcher.
    #[must_use]
    pub fn context(&self) -> &ContextMatcher {
        &self.context
    }

    /// Returns the used-symbol matcher.
    #[must_use]
    pub fn used(&self) -> &UsedMatcher {
        &self.used
    }

    /// Returns the usage kinds this rule applies to.
    #[must_use]
    pub fn sites(&self) -> &[UsageKind] {
        &self.sites
    }

    /// Returns the descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Tests whether using `used` from `context` as `kind` is forbidden by this rule.
    #[must_use]
    pub fn forbids<M: SymbolModel + ?Sized>(
        &self,
        context: SymbolId,
        used: SymbolId,
        kind: UsageKind,
        model: &M,
    ) -> bool {
        self.sites.contains(&kind)
            && self.context.matches(context, model)
            && self.used.matches(used, model)
    }
}

fn non_empty_name(name: String) -> Result<String, ModelError> {
    if name.trim().is_empty() {
        Err(ModelError::EmptyRuleName)
    } else {
        Ok(name)
    }
}

fn non_empty(value: String, field: &'static str) -> Result<String, ModelError> {
    if value.is_empty() {
        Err(ModelError::EmptyValue { field })
    } else {
        Ok(value)
    }
}

fn validate_context(matcher: &ContextMatcher) -> Result<(), ModelError> {
    match matcher {
        ContextMatcher::Any => Ok(()),
        ContextMatcher::DeclaringType(v) => non_empty(v.clone(), "declaring-type").map(drop),
        ContextMatcher::Name(v) => non_empty(v.clone(), "name").map(drop),
        ContextMatcher::NamespacePrefix(v) => non_empty(v.clone(), "namespace-prefix").map(drop),
    }
}

fn validate_used(matcher: &UsedMatcher) -> Result<(), ModelError> {
    match matcher {
        UsedMatcher::Any => Ok(()),
        UsedMatcher::Name(v) => non_empty(v.clone(), "name").map(drop),
        UsedMatcher::NamespacePrefix(v) => non_empty(v.clone(), "namespace-prefix").map(drop),
    }
}

// ────────────────────────────────────────────
// Registry (aggregate root)
// ────────────────────────────────────────────

/// Immutable, ordered set of restriction rules.
///
/// Built once and shared read-only (typically behind an `Arc`) by every
/// analysis pass.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    namespace_rules: Vec<NamespaceRule>,
    usage_rules: Vec<UsageRule>,
}

impl RuleRegistry {
    /// Creates a registry, checking that rule names are unique.
    ///
    /// # Errors
    ///
    /// Returns every duplicate-name error found.
    pub fn new(
        namespace_rules: Vec<NamespaceRule>,
        usage_rules: Vec<UsageRule>,
    ) -> Result<Self, Vec<ModelError>> {
        let errors: Vec<ModelError> = {
            let mut seen = HashSet::new();
            namespace_rules
                .iter()
                .map(NamespaceRule::name)
                .chain(usage_rules.iter().map(UsageRule::name))
                .filter(|name| !seen.insert(*name))
                .map(|name| ModelError::DuplicateRuleName {
                    name: name.to_string(),
                })
                .collect()
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            namespace_rules,
            usage_rules,
        })
    }

    /// Creates an empty registry that allows everything.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends another registry's rules after this one's.
    ///
    /// # Errors
    ///
    /// Returns duplicate-name errors across the two registries.
    pub fn merge(self, other: Self) -> Result<Self, Vec<ModelError>> {
        let mut namespace_rules = self.namespace_rules;
        namespace_rules.extend(other.namespace_rules);
        let mut usage_rules = self.usage_rules;
        usage_rules.extend(other.usage_rules);
        Self::new(namespace_rules, usage_rules)
    }

    /// Returns the namespace rules in registration order.
    #[must_use]
    pub fn namespace_rules(&self) -> &[NamespaceRule] {
        &self.namespace_rules
    }

    /// Returns the usage rules in registration order.
    #[must_use]
    pub fn usage_rules(&self) -> &[UsageRule] {
        &self.usage_rules
    }

    /// Total number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespace_rules.len() + self.usage_rules.len()
    }

    /// Returns true when no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolTable;

    #[test]
    fn category_ids_are_stable() {
        let ids: Vec<&str> = RuleCategory::ALL.iter().map(|c| c.default_id()).collect();
        assert_eq!(ids, ["NS001", "TU001", "GT001", "DL001", "AT001"]);
        assert_eq!(RuleCategory::parse("generic"), Some(RuleCategory::Generic));
        assert_eq!(RuleCategory::parse("Generic"), None);
    }

    #[test]
    fn descriptor_renders_both_slots() {
        let d = Descriptor::for_category(RuleCategory::Type);
        assert_eq!(
            d.render("ForbiddenType", "field"),
            "Usage of type 'ForbiddenType' is not allowed in 'field'"
        );
    }

    #[test]
    fn descriptor_does_not_fill_slots_inside_names() {
        let d = Descriptor::for_category(RuleCategory::Type)
            .with_template("{1} uses {0} {2}")
            .unwrap();
        assert_eq!(d.render("Weird{1}", "Run{0}"), "Run{0} uses Weird{1} {2}");
    }

    #[test]
    fn descriptor_rejects_template_without_slots() {
        let err = Descriptor::for_category(RuleCategory::Type)
            .with_template("no slots here")
            .expect_err("template must be rejected");
        assert!(matches!(err, ModelError::InvalidTemplate { .. }));
    }

    #[test]
    fn namespace_rule_is_plain_prefix_match() {
        let rule = NamespaceRule::new("r", "Company.Product", "System").unwrap();
        assert!(rule.forbids("Company.Product.Foo", "System.IO"));
        assert!(rule.forbids("Company.Product", "System"));
        assert!(!rule.forbids("Other.Product", "System.IO"));
        assert!(!rule.forbids("Company.Product.Foo", "Microsoft.Extensions"));
    }

    #[test]
    fn namespace_rule_rejects_empty_prefix() {
        let err = NamespaceRule::new("r", "", "System").unwrap_err();
        assert_eq!(err, ModelError::EmptyValue { field: "outer" });
    }

    #[test]
    fn usage_rule_cannot_be_namespace_category() {
        let err = UsageRule::new(
            "r",
            RuleCategory::Namespace,
            ContextMatcher::Any,
            UsedMatcher::Any,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::NamespaceSite { .. }));
    }

    #[test]
    fn usage_rule_rejects_empty_sites() {
        let rule = UsageRule::new("r", RuleCategory::Type, ContextMatcher::Any, UsedMatcher::Any)
            .unwrap();
        assert!(matches!(
            rule.with_sites(vec![]).unwrap_err(),
            ModelError::NoSites { .. }
        ));
    }

    #[test]
    fn matchers_read_through_the_model() {
        let mut table = SymbolTable::new();
        let restricted = table.add(Symbol::ty("RestrictedClass").in_namespace("App"));
        let method = table.add(
            Symbol::new(
                "SensitiveMethod",
                SymbolKind::Method {
                    return_type: None,
                    parameters: vec![],
                },
            )
            .in_type(restricted),
        );
        let file = table.add(Symbol::ty("File").in_namespace("System.IO"));

        assert!(ContextMatcher::DeclaringType("RestrictedClass".into()).matches(method, &table));
        assert!(!ContextMatcher::DeclaringType("RestrictedClass".into()).matches(restricted, &table));
        assert!(ContextMatcher::Name("SensitiveMethod".into()).matches(method, &table));
        // Members inherit the declaring type's namespace.
        assert!(ContextMatcher::NamespacePrefix("App".into()).matches(method, &table));
        assert!(UsedMatcher::NamespacePrefix("System.IO".into()).matches(file, &table));
        assert!(UsedMatcher::Name("File".into()).matches(file, &table));
        assert!(!UsedMatcher::Any.matches(SymbolId(99), &table));
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let a = NamespaceRule::new("dup", "A", "B").unwrap();
        let b = UsageRule::new("dup", RuleCategory::Type, ContextMatcher::Any, UsedMatcher::Any)
            .unwrap();
        let errors = RuleRegistry::new(vec![a], vec![b]).unwrap_err();
        assert_eq!(
            errors,
            vec![ModelError::DuplicateRuleName {
                name: "dup".to_string()
            }]
        );
    }

    #[test]
    fn merge_keeps_registration_order() {
        let first = RuleRegistry::new(vec![NamespaceRule::new("a", "A", "B").unwrap()], vec![])
            .unwrap();
        let second = RuleRegistry::new(vec![NamespaceRule::new("b", "C", "D").unwrap()], vec![])
            .unwrap();
        let merged = first.merge(second).unwrap();
        let names: Vec<&str> = merged.namespace_rules().iter().map(NamespaceRule::name).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
