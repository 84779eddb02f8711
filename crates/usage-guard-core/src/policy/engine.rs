//! Rule evaluation over usage sites.
//!
//! Evaluation is pure: it reads the registry and the symbol model and
//! returns findings. Unresolved symbols and exhausted descent budgets
//! produce no finding.

use std::collections::HashSet;

use tracing::trace;

use crate::policy::model::{Descriptor, RuleRegistry};
use crate::site::{Subject, UsageKind, UsageSite};
use crate::symbol::{SymbolId, SymbolModel};
use crate::syntax::Span;

/// Default bound on nested generic argument descent.
pub const DEFAULT_MAX_GENERIC_DEPTH: usize = 32;

/// Outcome of evaluating one (context, used) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'r> {
    /// No rule forbids the usage.
    Allowed,
    /// The first matching rule forbids the usage.
    Forbidden {
        /// Name of the matched rule.
        rule: &'r str,
        /// Descriptor of the matched rule.
        descriptor: &'r Descriptor,
    },
}

impl Verdict<'_> {
    /// Returns true for [`Verdict::Forbidden`].
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}

/// A forbidden usage, ready to be turned into a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding<'r> {
    /// Name of the matched rule.
    pub rule: &'r str,
    /// Descriptor of the matched rule.
    pub descriptor: &'r Descriptor,
    /// Display name of the used namespace, type, or symbol.
    pub used: String,
    /// Display name of the containing context.
    pub context: String,
    /// Span of the original syntactic occurrence.
    pub span: Span,
}

impl RuleRegistry {
    /// Evaluates a namespace-containment pair against the namespace rules.
    #[must_use]
    pub fn evaluate_namespace(&self, outer: &str, inner: &str) -> Verdict<'_> {
        self.namespace_rules()
            .iter()
            .find(|r| r.forbids(outer, inner))
            .map_or(Verdict::Allowed, |r| Verdict::Forbidden {
                rule: r.name(),
                descriptor: r.descriptor(),
            })
    }

    /// Evaluates a symbol usage against the usage rules.
    #[must_use]
    pub fn evaluate_usage<M: SymbolModel + ?Sized>(
        &self,
        context: SymbolId,
        used: SymbolId,
        kind: UsageKind,
        model: &M,
    ) -> Verdict<'_> {
        self.usage_rules()
            .iter()
            .find(|r| r.forbids(context, used, kind, model))
            .map_or(Verdict::Allowed, |r| Verdict::Forbidden {
                rule: r.name(),
                descriptor: r.descriptor(),
            })
    }
}

/// Evaluates usage sites, including descent into generic type arguments.
#[derive(Debug, Clone, Copy)]
pub struct PolicyEngine<'r> {
    registry: &'r RuleRegistry,
    max_generic_depth: usize,
}

impl<'r> PolicyEngine<'r> {
    /// Creates an engine over a registry with the default descent bound.
    #[must_use]
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            max_generic_depth: DEFAULT_MAX_GENERIC_DEPTH,
        }
    }

    /// Sets the maximum generic nesting depth that is descended into.
    #[must_use]
    pub fn with_max_generic_depth(mut self, depth: usize) -> Self {
        self.max_generic_depth = depth;
        self
    }

    /// Evaluates one usage site and appends its findings to `out`.
    ///
    /// A symbol site yields the finding for the used symbol itself, followed
    /// by findings for its type arguments in depth-first order. Each argument
    /// is judged independently of its enclosing generic type. A generic type
    /// that recurs among the arguments is still judged at every occurrence,
    /// but its own argument list is walked only once per site.
    pub fn evaluate<M: SymbolModel + ?Sized>(
        &self,
        site: &UsageSite,
        model: &M,
        out: &mut Vec<Finding<'r>>,
    ) {
        match &site.subject {
            Subject::Namespace(ns) => {
                if let Verdict::Forbidden { rule, descriptor } =
                    self.registry.evaluate_namespace(&ns.outer, &ns.inner)
                {
                    out.push(Finding {
                        rule,
                        descriptor,
                        used: ns.inner.clone(),
                        context: ns.outer.clone(),
                        span: site.span,
                    });
                }
            }
            Subject::Symbol { context, used } => {
                let Some(context_symbol) = model.symbol(*context) else {
                    trace!("unresolved context {context}, skipping");
                    return;
                };
                let mut descent = Descent::default();
                self.evaluate_symbol(
                    &context_symbol.name,
                    *context,
                    *used,
                    site.kind,
                    site.span,
                    model,
                    &mut descent,
                    out,
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate_symbol<M: SymbolModel + ?Sized>(
        &self,
        context_name: &str,
        context: SymbolId,
        used: SymbolId,
        kind: UsageKind,
        span: Span,
        model: &M,
        descent: &mut Descent,
        out: &mut Vec<Finding<'r>>,
    ) {
        if descent.path.contains(&used) {
            trace!("generic argument cycle at {used}, treating as unresolved");
            return;
        }
        if descent.path.len() > self.max_generic_depth {
            trace!(
                "generic descent deeper than {}, treating as unresolved",
                self.max_generic_depth
            );
            return;
        }
        let Some(used_symbol) = model.symbol(used) else {
            trace!("unresolved used symbol {used}, skipping");
            return;
        };

        if let Verdict::Forbidden { rule, descriptor } =
            self.registry.evaluate_usage(context, used, kind, model)
        {
            out.push(Finding {
                rule,
                descriptor,
                used: used_symbol.name.clone(),
                context: context_name.to_string(),
                span,
            });
        }

        let args = used_symbol.type_args();
        if args.is_empty() {
            return;
        }
        if !descent.expanded.insert(used) {
            trace!("arguments of {used} already expanded for this site");
            return;
        }
        descent.path.push(used);
        for &arg in args {
            self.evaluate_symbol(
                context_name,
                context,
                arg,
                UsageKind::TypeArgument,
                span,
                model,
                descent,
                out,
            );
        }
        descent.path.pop();
    }
}

/// Per-site descent state: the ancestor chain and the generic types whose
/// argument lists were already walked.
#[derive(Default)]
struct Descent {
    path: Vec<SymbolId>,
    expanded: HashSet<SymbolId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::model::{
        ContextMatcher, NamespaceRule, RuleCategory, UsageRule, UsedMatcher,
    };
    use crate::symbol::{Symbol, SymbolKind, SymbolTable};

    fn forbid_names(names: &[&str]) -> RuleRegistry {
        let rules = names
            .iter()
            .map(|n| {
                UsageRule::new(
                    format!("no-{n}"),
                    RuleCategory::Type,
                    ContextMatcher::Any,
                    UsedMatcher::Name((*n).to_string()),
                )
                .unwrap()
            })
            .collect();
        RuleRegistry::new(vec![], rules).unwrap()
    }

    fn method(table: &mut SymbolTable, name: &str) -> SymbolId {
        table.add(Symbol::new(
            name,
            SymbolKind::Method {
                return_type: None,
                parameters: vec![],
            },
        ))
    }

    fn generic(name: &str, args: Vec<SymbolId>) -> Symbol {
        Symbol::new(
            name,
            SymbolKind::Type {
                type_args: args,
                element: None,
            },
        )
    }

    fn run(registry: &RuleRegistry, site: &UsageSite, table: &SymbolTable) -> Vec<String> {
        let mut out = Vec::new();
        PolicyEngine::new(registry).evaluate(site, table, &mut out);
        out.into_iter().map(|f| f.used).collect()
    }

    #[test]
    fn namespace_first_match_wins() {
        let first = NamespaceRule::new("first", "Company", "System").unwrap();
        let second = NamespaceRule::new("second", "Company.Product", "System.IO").unwrap();
        let registry = RuleRegistry::new(vec![first, second], vec![]).unwrap();
        match registry.evaluate_namespace("Company.Product.Foo", "System.IO") {
            Verdict::Forbidden { rule, .. } => assert_eq!(rule, "first"),
            Verdict::Allowed => panic!("expected a forbidding verdict"),
        }
        assert_eq!(
            registry.evaluate_namespace("Other", "System.IO"),
            Verdict::Allowed
        );
    }

    #[test]
    fn generic_outer_and_arguments_are_independent() {
        // T<A, B>: T forbidden, A allowed, B forbidden -> exactly T and B.
        let mut table = SymbolTable::new();
        let a = table.add(Symbol::ty("A"));
        let b = table.add(Symbol::ty("B"));
        let t = table.add(generic("T", vec![a, b]));
        let ctx = method(&mut table, "Run");
        let registry = forbid_names(&["T", "B"]);

        let site = UsageSite::symbol(ctx, t, Span::at(4, 2), UsageKind::Type);
        assert_eq!(run(&registry, &site, &table), ["T", "B"]);
    }

    #[test]
    fn allowed_outer_still_descends() {
        let mut table = SymbolTable::new();
        let foo = table.add(Symbol::ty("Foo"));
        let inner = table.add(generic("List", vec![foo]));
        let outer = table.add(generic("Task", vec![inner]));
        let ctx = method(&mut table, "Run");
        let registry = forbid_names(&["Foo"]);

        let site = UsageSite::symbol(ctx, outer, Span::at(1, 1), UsageKind::Type);
        let mut out = Vec::new();
        PolicyEngine::new(&registry).evaluate(&site, &table, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].used, "Foo");
        assert_eq!(out[0].context, "Run");
        assert_eq!(out[0].span, Span::at(1, 1));
    }

    #[test]
    fn repeated_sibling_arguments_are_each_reported() {
        let mut table = SymbolTable::new();
        let foo = table.add(Symbol::ty("Foo"));
        let map = table.add(generic("Map", vec![foo, foo]));
        let ctx = method(&mut table, "Run");
        let registry = forbid_names(&["Foo"]);

        let site = UsageSite::symbol(ctx, map, Span::at(1, 1), UsageKind::Type);
        assert_eq!(run(&registry, &site, &table), ["Foo", "Foo"]);
    }

    #[test]
    fn shared_generic_arguments_are_walked_once() {
        // Pair24<Pair23, Pair23>, ..., Pair1<Leaf, Leaf>
        let mut table = SymbolTable::new();
        let mut current = table.add(Symbol::ty("Leaf"));
        for i in 1..=24 {
            current = table.add(generic(&format!("Pair{i}"), vec![current, current]));
        }
        let ctx = method(&mut table, "Run");
        let site = UsageSite::symbol(ctx, current, Span::at(1, 1), UsageKind::Type);

        let registry = forbid_names(&["Leaf"]);
        assert_eq!(run(&registry, &site, &table), ["Leaf", "Leaf"]);

        let registry = forbid_names(&["Pair1"]);
        assert_eq!(run(&registry, &site, &table), ["Pair1", "Pair1"]);
    }

    #[test]
    fn self_referential_arguments_terminate() {
        let mut table = SymbolTable::new();
        let node = table.add(Symbol::ty("Node"));
        table.replace(node, generic("Node", vec![node]));
        let ctx = method(&mut table, "Run");
        let registry = forbid_names(&["Node"]);

        let site = UsageSite::symbol(ctx, node, Span::at(1, 1), UsageKind::Type);
        assert_eq!(run(&registry, &site, &table), ["Node"]);
    }

    #[test]
    fn depth_cap_cuts_long_chains() {
        let mut table = SymbolTable::new();
        let mut current = table.add(Symbol::ty("Leaf"));
        for i in 0..10 {
            current = table.add(generic(&format!("Wrap{i}"), vec![current]));
        }
        let ctx = method(&mut table, "Run");
        let registry = forbid_names(&["Leaf"]);
        let site = UsageSite::symbol(ctx, current, Span::at(1, 1), UsageKind::Type);

        let mut out = Vec::new();
        PolicyEngine::new(&registry)
            .with_max_generic_depth(3)
            .evaluate(&site, &table, &mut out);
        assert!(out.is_empty());

        let mut out = Vec::new();
        PolicyEngine::new(&registry).evaluate(&site, &table, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn unresolved_context_or_used_yields_nothing() {
        let mut table = SymbolTable::new();
        let foo = table.add(Symbol::ty("Foo"));
        let ctx = method(&mut table, "Run");
        let registry = forbid_names(&["Foo"]);

        let dangling_ctx = UsageSite::symbol(SymbolId(77), foo, Span::at(1, 1), UsageKind::Type);
        let dangling_used = UsageSite::symbol(ctx, SymbolId(77), Span::at(1, 1), UsageKind::Type);
        assert!(run(&registry, &dangling_ctx, &table).is_empty());
        assert!(run(&registry, &dangling_used, &table).is_empty());
    }

    #[test]
    fn unresolved_argument_skips_only_that_branch() {
        let mut table = SymbolTable::new();
        let foo = table.add(Symbol::ty("Foo"));
        let pair = table.add(generic("Pair", vec![SymbolId(500), foo]));
        let ctx = method(&mut table, "Run");
        let registry = forbid_names(&["Foo"]);

        let site = UsageSite::symbol(ctx, pair, Span::at(1, 1), UsageKind::Type);
        assert_eq!(run(&registry, &site, &table), ["Foo"]);
    }

    #[test]
    fn generic_category_only_sees_type_arguments() {
        let mut table = SymbolTable::new();
        let foo = table.add(Symbol::ty("Foo"));
        let list = table.add(generic("List", vec![foo]));
        let ctx = method(&mut table, "Run");
        let rule = UsageRule::new(
            "no-foo-args",
            RuleCategory::Generic,
            ContextMatcher::Any,
            UsedMatcher::Name("Foo".into()),
        )
        .unwrap();
        let registry = RuleRegistry::new(vec![], vec![rule]).unwrap();

        let direct = UsageSite::symbol(ctx, foo, Span::at(1, 1), UsageKind::Type);
        assert!(run(&registry, &direct, &table).is_empty());

        let nested = UsageSite::symbol(ctx, list, Span::at(2, 1), UsageKind::Type);
        let mut out = Vec::new();
        PolicyEngine::new(&registry).evaluate(&nested, &table, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].descriptor.id(), "GT001");
    }
}
