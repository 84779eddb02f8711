//! Tree traversal driving extraction, evaluation and emission.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::emitter::{emit, DiagnosticSink};
use crate::extractor::{extract, Scope};
use crate::policy::engine::{PolicyEngine, DEFAULT_MAX_GENERIC_DEPTH};
use crate::policy::model::RuleRegistry;
use crate::symbol::SymbolModel;
use crate::syntax::{SyntaxNode, SyntaxTree};
use crate::types::Diagnostic;

/// Checks syntax trees against a shared, immutable rule registry.
///
/// The engine holds no per-pass state, so one instance can serve any number
/// of concurrent passes.
#[derive(Debug, Clone)]
pub struct UsageEngine {
    registry: Arc<RuleRegistry>,
    max_generic_depth: usize,
}

impl UsageEngine {
    /// Creates an engine over a registry.
    #[must_use]
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            max_generic_depth: DEFAULT_MAX_GENERIC_DEPTH,
        }
    }

    /// Sets the bound on nested generic argument descent.
    #[must_use]
    pub fn with_max_generic_depth(mut self, depth: usize) -> Self {
        self.max_generic_depth = depth;
        self
    }

    /// Returns the rule registry.
    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    fn policy(&self) -> PolicyEngine<'_> {
        PolicyEngine::new(&self.registry).with_max_generic_depth(self.max_generic_depth)
    }

    /// Checks a single node, without visiting its children.
    ///
    /// For hosts that drive traversal themselves: the caller supplies the
    /// enclosing [`Scope`] and keeps it current with [`Scope::enter`].
    pub fn check_node<M, S>(
        &self,
        node: &SyntaxNode,
        scope: &Scope,
        model: &M,
        file: &Path,
        sink: &mut S,
    ) where
        M: SymbolModel + ?Sized,
        S: DiagnosticSink + ?Sized,
    {
        let policy = self.policy();
        let mut findings = Vec::new();
        for site in extract(node, scope, model) {
            policy.evaluate(&site, model, &mut findings);
        }
        emit(&findings, file, sink);
    }

    /// Walks a tree from `root` in source order and checks every node.
    pub fn check_root<M, S>(&self, root: &SyntaxNode, model: &M, file: &Path, sink: &mut S)
    where
        M: SymbolModel + ?Sized,
        S: DiagnosticSink + ?Sized,
    {
        let policy = self.policy();
        let mut findings = Vec::new();
        let mut stack = vec![(root, Scope::root())];
        let mut visited = 0usize;

        while let Some((node, scope)) = stack.pop() {
            visited += 1;
            for site in extract(node, &scope, model) {
                policy.evaluate(&site, model, &mut findings);
            }
            let inner = scope.enter(node);
            stack.extend(node.children.iter().rev().map(|c| (c, inner.clone())));
        }

        debug!(
            "{}: {} nodes, {} findings",
            file.display(),
            visited,
            findings.len()
        );
        emit(&findings, file, sink);
    }

    /// Checks a whole tree document.
    pub fn check_tree<S: DiagnosticSink + ?Sized>(&self, tree: &SyntaxTree, sink: &mut S) {
        self.check_root(&tree.root, &tree.symbols, &tree.file, sink);
    }

    /// Checks a whole tree document and returns its diagnostics.
    #[must_use]
    pub fn diagnostics(&self, tree: &SyntaxTree) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        self.check_tree(tree, &mut out);
        out
    }
}
