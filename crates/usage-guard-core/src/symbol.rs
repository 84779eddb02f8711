//! Resolved symbol information supplied by the host.
//!
//! The host's semantic service owns symbol resolution. The engine only
//! reads symbols through the [`SymbolModel`] trait and never mutates them.
//! Every lookup returns `Option`: a missing or dangling reference means
//! "unresolved" and the caller skips the usage.

use serde::{Deserialize, Serialize};

/// Handle to a symbol in the host's symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind-specific data of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SymbolKind {
    /// A namespace.
    Namespace,
    /// A named type (class, struct, interface, enum, array).
    Type {
        /// Type arguments of a constructed generic type.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_args: Vec<SymbolId>,
        /// Element type when this is an array type.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<SymbolId>,
    },
    /// A method, constructor, or lambda signature.
    Method {
        /// Declared or inferred return type.
        #[serde(default)]
        return_type: Option<SymbolId>,
        /// Parameter symbols, in declaration order.
        #[serde(default)]
        parameters: Vec<SymbolId>,
    },
    /// A property or indexer.
    Property {
        /// Declared value type.
        #[serde(default)]
        value_type: Option<SymbolId>,
    },
    /// A field.
    Field {
        /// Declared field type.
        #[serde(default)]
        field_type: Option<SymbolId>,
    },
    /// A delegate type.
    Delegate {
        /// Return type of the delegate's signature.
        #[serde(default)]
        return_type: Option<SymbolId>,
        /// Parameter symbols of the delegate's signature.
        #[serde(default)]
        parameters: Vec<SymbolId>,
        /// Type arguments of a constructed generic delegate.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_args: Vec<SymbolId>,
    },
    /// An applied attribute's constructor; `containing_type` is the attribute class.
    Attribute,
    /// A parameter of a method, lambda, or delegate.
    Parameter {
        /// Declared parameter type.
        #[serde(default)]
        param_type: Option<SymbolId>,
    },
}

/// A resolved named entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Simple name (e.g., `List`, `SensitiveMethod`, `IO`).
    pub name: String,
    /// Dotted path of the containing namespace, if any.
    #[serde(default, rename = "namespace", skip_serializing_if = "Option::is_none")]
    pub containing_namespace: Option<String>,
    /// The type declaring this symbol, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_type: Option<SymbolId>,
    /// Kind-specific data.
    #[serde(flatten)]
    pub kind: SymbolKind,
}

impl Symbol {
    /// Creates a symbol of the given kind with no containers.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            containing_namespace: None,
            containing_type: None,
            kind,
        }
    }

    /// Creates a non-generic type symbol.
    #[must_use]
    pub fn ty(name: impl Into<String>) -> Self {
        Self::new(
            name,
            SymbolKind::Type {
                type_args: Vec::new(),
                element: None,
            },
        )
    }

    /// Creates a namespace symbol from a dotted path (`System.IO`).
    #[must_use]
    pub fn namespace(qualified: &str) -> Self {
        match qualified.rsplit_once('.') {
            Some((parent, name)) => Self::new(name, SymbolKind::Namespace).in_namespace(parent),
            None => Self::new(qualified, SymbolKind::Namespace),
        }
    }

    /// Sets the containing namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.containing_namespace = Some(namespace.into());
        self
    }

    /// Sets the containing type.
    #[must_use]
    pub fn in_type(mut self, containing_type: SymbolId) -> Self {
        self.containing_type = Some(containing_type);
        self
    }

    /// Returns `namespace.name`, or just `name` without a namespace.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.containing_namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Returns the generic type arguments (empty for non-generic symbols).
    #[must_use]
    pub fn type_args(&self) -> &[SymbolId] {
        match &self.kind {
            SymbolKind::Type { type_args, .. } | SymbolKind::Delegate { type_args, .. } => {
                type_args
            }
            _ => &[],
        }
    }
}

/// Read-only access to the host's resolved symbols.
///
/// Implementations may resolve eagerly, lazily or from a cache; the engine
/// only requires that lookups are side-effect free for the duration of a pass.
pub trait SymbolModel: Send + Sync {
    /// Resolves a symbol handle. `None` means unresolved.
    fn symbol(&self, id: SymbolId) -> Option<&Symbol>;

    /// Resolves a handle that must name a namespace.
    fn namespace(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbol(id)
            .filter(|s| matches!(s.kind, SymbolKind::Namespace))
    }

    /// Resolves the declaring type of a symbol.
    fn containing_type(&self, id: SymbolId) -> Option<SymbolId> {
        let owner = self.symbol(id)?.containing_type?;
        self.symbol(owner).map(|_| owner)
    }

    /// Resolves the return type of a method or delegate.
    fn return_type(&self, id: SymbolId) -> Option<SymbolId> {
        match &self.symbol(id)?.kind {
            SymbolKind::Method { return_type, .. } | SymbolKind::Delegate { return_type, .. } => {
                *return_type
            }
            _ => None,
        }
    }

    /// Resolves the parameter types of a method or delegate.
    ///
    /// Parameters whose type is unresolved are left out.
    fn parameter_types(&self, id: SymbolId) -> Vec<SymbolId> {
        let Some(symbol) = self.symbol(id) else {
            return Vec::new();
        };
        let parameters = match &symbol.kind {
            SymbolKind::Method { parameters, .. } | SymbolKind::Delegate { parameters, .. } => {
                parameters
            }
            _ => return Vec::new(),
        };
        parameters
            .iter()
            .filter_map(|p| match &self.symbol(*p)?.kind {
                SymbolKind::Parameter { param_type } => *param_type,
                _ => None,
            })
            .collect()
    }

    /// Resolves the value type of a property or indexer.
    fn value_type(&self, id: SymbolId) -> Option<SymbolId> {
        match &self.symbol(id)?.kind {
            SymbolKind::Property { value_type } => *value_type,
            _ => None,
        }
    }

    /// Resolves the element type of an array type.
    fn element_type(&self, id: SymbolId) -> Option<SymbolId> {
        match &self.symbol(id)?.kind {
            SymbolKind::Type { element, .. } => *element,
            _ => None,
        }
    }
}

/// In-memory symbol table indexed by [`SymbolId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a symbol and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if the table already holds `u32::MAX` symbols.
    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        let id = u32::try_from(self.symbols.len()).unwrap_or(u32::MAX);
        assert!(id < u32::MAX, "symbol table is full");
        self.symbols.push(symbol);
        SymbolId(id)
    }

    /// Replaces the symbol behind an existing handle.
    ///
    /// Lets callers build self-referential types. Returns `false` when the
    /// handle is dangling.
    pub fn replace(&mut self, id: SymbolId, symbol: Symbol) -> bool {
        match self.symbols.get_mut(id.0 as usize) {
            Some(slot) => {
                *slot = symbol;
                true
            }
            None => false,
        }
    }

    /// Number of symbols in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true when the table holds no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolModel for SymbolTable {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_constructor_splits_dotted_path() {
        let ns = Symbol::namespace("System.IO");
        assert_eq!(ns.name, "IO");
        assert_eq!(ns.containing_namespace.as_deref(), Some("System"));
        assert_eq!(ns.qualified_name(), "System.IO");
        assert_eq!(Symbol::namespace("System").qualified_name(), "System");
    }

    #[test]
    fn dangling_handles_are_unresolved() {
        let table = SymbolTable::new();
        assert!(table.symbol(SymbolId(7)).is_none());
        assert!(table.return_type(SymbolId(7)).is_none());
        assert!(table.parameter_types(SymbolId(7)).is_empty());
    }

    #[test]
    fn parameter_types_skip_unresolved_parameters() {
        let mut table = SymbolTable::new();
        let int = table.add(Symbol::ty("Int32").in_namespace("System"));
        let p1 = table.add(Symbol::new("a", SymbolKind::Parameter { param_type: Some(int) }));
        let p2 = table.add(Symbol::new("b", SymbolKind::Parameter { param_type: None }));
        let m = table.add(Symbol::new(
            "Run",
            SymbolKind::Method {
                return_type: None,
                parameters: vec![p1, p2, SymbolId(99)],
            },
        ));
        assert_eq!(table.parameter_types(m), vec![int]);
        assert_eq!(table.return_type(m), None);
    }

    #[test]
    fn containing_type_requires_resolvable_owner() {
        let mut table = SymbolTable::new();
        let owner = table.add(Symbol::ty("Owner"));
        let field = table.add(Symbol::new("f", SymbolKind::Field { field_type: None }).in_type(owner));
        let orphan =
            table.add(Symbol::new("g", SymbolKind::Field { field_type: None }).in_type(SymbolId(42)));
        assert_eq!(table.containing_type(field), Some(owner));
        assert_eq!(table.containing_type(orphan), None);
    }

    #[test]
    fn namespace_lookup_rejects_types() {
        let mut table = SymbolTable::new();
        let ty = table.add(Symbol::ty("File").in_namespace("System.IO"));
        let ns = table.add(Symbol::namespace("System.IO"));
        assert!(table.namespace(ty).is_none());
        assert!(table.namespace(ns).is_some());
    }

    #[test]
    fn deserializes_tagged_symbols() {
        let json = r#"[
            {"name": "IO", "namespace": "System", "kind": "namespace"},
            {"name": "List", "namespace": "System.Collections.Generic", "kind": "type", "type_args": [2]},
            {"name": "Foo", "kind": "type"}
        ]"#;
        let table: SymbolTable = serde_json::from_str(json).expect("valid table");
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.symbol(SymbolId(1)).map(Symbol::type_args),
            Some(&[SymbolId(2)][..])
        );
    }
}
