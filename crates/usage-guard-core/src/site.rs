//! Usage sites: the uniform input of the policy engine.

use serde::{Deserialize, Serialize};

use crate::symbol::SymbolId;
use crate::syntax::Span;

/// What kind of check a usage site calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageKind {
    /// Namespace-to-namespace containment (nested declaration or import).
    Namespace,
    /// A type or member's type referenced directly.
    Type,
    /// A type argument reached by descending into a generic usage.
    TypeArgument,
    /// A delegate type at its declaration.
    Delegate,
    /// The declaring type of an applied attribute.
    Attribute,
}

impl UsageKind {
    /// All usage kinds checked by usage rules (everything but namespaces).
    pub const SYMBOL_KINDS: [Self; 4] = [
        Self::Type,
        Self::TypeArgument,
        Self::Delegate,
        Self::Attribute,
    ];

    /// Returns true for the namespace-containment rule family.
    #[must_use]
    pub fn is_namespace(self) -> bool {
        matches!(self, Self::Namespace)
    }
}

/// One side of a namespace-containment check.
///
/// Names are kept as text: nested declarations compare names as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceUse {
    /// The enclosing namespace (`Company.Product.Foo`).
    pub outer: String,
    /// The declared or imported namespace (`System.IO`).
    pub inner: String,
}

/// The subject of a usage site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// A namespace-containment pair.
    Namespace(NamespaceUse),
    /// A symbol used from within a context symbol.
    Symbol {
        /// The enclosing declaration.
        context: SymbolId,
        /// The used type or symbol.
        used: SymbolId,
    },
}

/// One syntactic occurrence to evaluate against the rule registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSite {
    /// What is being used, and from where.
    pub subject: Subject,
    /// Span of the original syntactic occurrence.
    pub span: Span,
    /// Which rule family applies.
    pub kind: UsageKind,
}

impl UsageSite {
    /// Creates a namespace-containment site.
    #[must_use]
    pub fn namespace(outer: impl Into<String>, inner: impl Into<String>, span: Span) -> Self {
        Self {
            subject: Subject::Namespace(NamespaceUse {
                outer: outer.into(),
                inner: inner.into(),
            }),
            span,
            kind: UsageKind::Namespace,
        }
    }

    /// Creates a symbol usage site.
    #[must_use]
    pub fn symbol(context: SymbolId, used: SymbolId, span: Span, kind: UsageKind) -> Self {
        Self {
            subject: Subject::Symbol { context, used },
            span,
            kind,
        }
    }
}
