//! Usage-site extraction.
//!
//! Maps each syntactic shape to the usage sites it implies. Extraction is
//! shallow: it looks at one node and never at its children. The walker in
//! [`crate::engine`] supplies the enclosing [`Scope`].

use tracing::trace;

use crate::site::{UsageKind, UsageSite};
use crate::symbol::{SymbolId, SymbolKind, SymbolModel};
use crate::syntax::{NodeKind, Span, SyntaxNode, TypeSyntax};

/// Lexical position of a node: its enclosing declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    /// Innermost enclosing declaration symbol. `None` at file level or when
    /// the enclosing declaration is unresolved.
    pub context: Option<SymbolId>,
    /// Innermost enclosing namespace declaration symbol.
    pub namespace: Option<SymbolId>,
    /// Innermost enclosing namespace name, as written in source.
    pub namespace_name: Option<String>,
}

impl Scope {
    /// The scope of a file's top level.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a scope inside a resolved declaration.
    #[must_use]
    pub fn within(context: SymbolId) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    /// Sets the enclosing namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: Option<SymbolId>, name: impl Into<String>) -> Self {
        self.namespace = namespace;
        self.namespace_name = Some(name.into());
        self
    }

    /// Returns the scope that applies to the children of `node`.
    #[must_use]
    pub fn enter(&self, node: &SyntaxNode) -> Self {
        let mut inner = self.clone();
        if let NodeKind::Namespace { name, symbol, .. } = &node.kind {
            inner.namespace = *symbol;
            inner.namespace_name = Some(name.clone());
        }
        if let Some(declared) = node.kind.declared_context() {
            inner.context = declared;
        }
        inner
    }
}

/// Derives the usage sites of a single node.
///
/// Declarations are their own context; every other shape uses the scope's
/// context. Anything unresolved yields no site.
#[must_use]
pub fn extract<M: SymbolModel + ?Sized>(
    node: &SyntaxNode,
    scope: &Scope,
    model: &M,
) -> Vec<UsageSite> {
    let mut sites = Vec::new();
    let context = match node.kind.declared_context() {
        Some(declared) => declared,
        None => scope.context,
    };

    match &node.kind {
        NodeKind::Namespace {
            name, name_span, ..
        } => {
            if let Some(outer) = &scope.namespace_name {
                sites.push(UsageSite::namespace(outer.clone(), name.clone(), *name_span));
            }
        }
        NodeKind::Using {
            namespace,
            name_span,
        } => {
            let imported = namespace.and_then(|id| model.namespace(id));
            let enclosing = scope.namespace.and_then(|id| model.namespace(id));
            match (imported, enclosing) {
                (Some(inner), Some(outer)) => sites.push(UsageSite::namespace(
                    outer.qualified_name(),
                    inner.qualified_name(),
                    *name_span,
                )),
                _ => trace!("using at {}:{} has no resolvable namespace pair", name_span.line, name_span.column),
            }
        }
        NodeKind::ObjectCreation { ty } => {
            push_type(&mut sites, context, *ty, node.span);
        }
        NodeKind::Invocation { method } => {
            if let Some(method) = method.filter(|m| is_method(*m, model)) {
                push_type(&mut sites, context, model.containing_type(method), node.span);
                push_signature(&mut sites, context, method, node.span, node.span, model);
            }
        }
        NodeKind::MemberAccess { member } => {
            if let Some(member) = *member {
                push_type(&mut sites, context, model.containing_type(member), node.span);
                push_type(&mut sites, context, model.value_type(member), node.span);
            }
        }
        NodeKind::Method { return_type: ty, .. }
        | NodeKind::Property { ty, .. }
        | NodeKind::Indexer { ty, .. }
        | NodeKind::Field { ty, .. }
        | NodeKind::LocalVariable { ty }
        | NodeKind::Parameter { ty }
        | NodeKind::TypeOf { ty }
        | NodeKind::Cast { ty }
        | NodeKind::As { ty }
        | NodeKind::Default { ty }
        | NodeKind::ArrayCreation { element: ty } => {
            push_syntax(&mut sites, context, ty);
        }
        NodeKind::BaseList { types } => {
            for ty in types {
                push_syntax(&mut sites, context, ty);
            }
        }
        NodeKind::GenericName { symbol } => {
            let generic = symbol.filter(|s| {
                model.symbol(*s).is_some_and(|s| {
                    matches!(s.kind, SymbolKind::Type { .. } | SymbolKind::Delegate { .. })
                })
            });
            push_type(&mut sites, context, generic, node.span);
        }
        NodeKind::Delegate {
            symbol,
            identifier_span,
            return_type_span,
            parameter_list_span,
        } => {
            if let (Some(context), Some(delegate)) = (context, *symbol) {
                if model.symbol(delegate).is_some() {
                    sites.push(UsageSite::symbol(
                        context,
                        delegate,
                        *identifier_span,
                        UsageKind::Delegate,
                    ));
                    push_signature(
                        &mut sites,
                        Some(context),
                        delegate,
                        *return_type_span,
                        *parameter_list_span,
                        model,
                    );
                }
            }
        }
        NodeKind::Attribute {
            constructor,
            name_span,
        } => {
            let declaring = constructor.and_then(|c| model.containing_type(c));
            if let (Some(context), Some(declaring)) = (context, declaring) {
                sites.push(UsageSite::symbol(
                    context,
                    declaring,
                    *name_span,
                    UsageKind::Attribute,
                ));
            }
        }
        NodeKind::Lambda { signature } => {
            if let Some(signature) = signature.filter(|s| is_method(*s, model)) {
                push_signature(&mut sites, context, signature, node.span, node.span, model);
            }
        }
        NodeKind::ImplicitArrayCreation { array_type } => {
            let element = array_type.and_then(|a| model.element_type(a));
            push_type(&mut sites, context, element, node.span);
        }
        NodeKind::CompilationUnit | NodeKind::TypeDeclaration { .. } | NodeKind::Other { .. } => {}
    }

    if !sites.is_empty() {
        trace!(
            "{} at {}:{} produced {} usage sites",
            node.kind.name(),
            node.span.line,
            node.span.column,
            sites.len()
        );
    }
    sites
}

fn is_method<M: SymbolModel + ?Sized>(id: SymbolId, model: &M) -> bool {
    model
        .symbol(id)
        .is_some_and(|s| matches!(s.kind, SymbolKind::Method { .. }))
}

fn push_type(
    sites: &mut Vec<UsageSite>,
    context: Option<SymbolId>,
    used: Option<SymbolId>,
    span: Span,
) {
    if let (Some(context), Some(used)) = (context, used) {
        sites.push(UsageSite::symbol(context, used, span, UsageKind::Type));
    }
}

fn push_syntax(sites: &mut Vec<UsageSite>, context: Option<SymbolId>, ty: &TypeSyntax) {
    push_type(sites, context, ty.ty, ty.span);
}

/// Return type at `return_span`, then each parameter type at `params_span`.
fn push_signature<M: SymbolModel + ?Sized>(
    sites: &mut Vec<UsageSite>,
    context: Option<SymbolId>,
    callable: SymbolId,
    return_span: Span,
    params_span: Span,
    model: &M,
) {
    push_type(sites, context, model.return_type(callable), return_span);
    for param in model.parameter_types(callable) {
        push_type(sites, context, Some(param), params_span);
    }
}
