//! Symbol-annotated syntax trees supplied by the host.
//!
//! The host's parser and semantic service produce these trees; the engine
//! only walks them. Each node kind carries the spans and symbol handles the
//! usage-site extractor needs for that syntactic shape.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::symbol::{SymbolId, SymbolTable};

/// A source span (1-indexed line and column).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in file.
    #[serde(default)]
    pub offset: usize,
    /// Length in bytes.
    #[serde(default)]
    pub length: usize,
}

impl Span {
    /// Creates a span at a line and column.
    #[must_use]
    pub fn at(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            offset: 0,
            length: 0,
        }
    }
}

/// A type written in source together with its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSyntax {
    /// Resolved type, `None` when the host could not bind it.
    #[serde(default)]
    pub ty: Option<SymbolId>,
    /// Span of the type syntax.
    pub span: Span,
}

impl TypeSyntax {
    /// Creates a type syntax bound to a resolved type.
    #[must_use]
    pub fn resolved(ty: SymbolId, span: Span) -> Self {
        Self { ty: Some(ty), span }
    }

    /// Creates a type syntax the host could not bind.
    #[must_use]
    pub fn unresolved(span: Span) -> Self {
        Self { ty: None, span }
    }
}

/// The syntactic shape of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "kebab-case")]
pub enum NodeKind {
    /// Root of a file.
    CompilationUnit,
    /// `namespace A.B { ... }`
    Namespace {
        /// Name as written in source.
        name: String,
        /// Span of the name.
        name_span: Span,
        /// The declared namespace.
        #[serde(default)]
        symbol: Option<SymbolId>,
    },
    /// `class`, `struct`, `interface`, `enum` declaration.
    TypeDeclaration {
        /// The declared type.
        #[serde(default)]
        symbol: Option<SymbolId>,
    },
    /// Method declaration with its return type.
    Method {
        /// The declared method.
        #[serde(default)]
        symbol: Option<SymbolId>,
        /// Declared return type.
        return_type: TypeSyntax,
    },
    /// Property declaration with its value type.
    Property {
        /// The declared property.
        #[serde(default)]
        symbol: Option<SymbolId>,
        /// Declared value type.
        #[serde(rename = "type")]
        ty: TypeSyntax,
    },
    /// Indexer declaration with its value type.
    Indexer {
        /// The declared indexer.
        #[serde(default)]
        symbol: Option<SymbolId>,
        /// Declared value type.
        #[serde(rename = "type")]
        ty: TypeSyntax,
    },
    /// Field declaration (one declared type, any number of variables).
    Field {
        /// The declared field.
        #[serde(default)]
        symbol: Option<SymbolId>,
        /// Declared type.
        #[serde(rename = "type")]
        ty: TypeSyntax,
    },
    /// Local variable declaration.
    LocalVariable {
        /// Declared type.
        #[serde(rename = "type")]
        ty: TypeSyntax,
    },
    /// Parameter declaration.
    Parameter {
        /// Declared type.
        #[serde(rename = "type")]
        ty: TypeSyntax,
    },
    /// Base-type list of a type declaration.
    BaseList {
        /// Listed base types.
        types: Vec<TypeSyntax>,
    },
    /// `new T(...)`
    ObjectCreation {
        /// Constructed type.
        #[serde(default)]
        ty: Option<SymbolId>,
    },
    /// `f(...)`
    Invocation {
        /// Called method.
        #[serde(default)]
        method: Option<SymbolId>,
    },
    /// `a.B`
    MemberAccess {
        /// Accessed member.
        #[serde(default)]
        member: Option<SymbolId>,
    },
    /// `typeof(T)`
    TypeOf {
        /// Queried type.
        #[serde(rename = "type")]
        ty: TypeSyntax,
    },
    /// `(T)expr`
    Cast {
        /// Target type.
        #[serde(rename = "type")]
        ty: TypeSyntax,
    },
    /// `expr as T`
    As {
        /// Target type.
        #[serde(rename = "type")]
        ty: TypeSyntax,
    },
    /// `Name<A, B>`
    GenericName {
        /// The constructed generic type.
        #[serde(default)]
        symbol: Option<SymbolId>,
    },
    /// `delegate R D(P...)`
    Delegate {
        /// The declared delegate type.
        #[serde(default)]
        symbol: Option<SymbolId>,
        /// Span of the delegate's identifier.
        identifier_span: Span,
        /// Span of the return type.
        return_type_span: Span,
        /// Span of the parameter list.
        parameter_list_span: Span,
    },
    /// `[Attr(...)]`
    Attribute {
        /// The attribute constructor.
        #[serde(default)]
        constructor: Option<SymbolId>,
        /// Span of the attribute name.
        name_span: Span,
    },
    /// `(a, b) => ...` or `a => ...`
    Lambda {
        /// The lambda's inferred signature.
        #[serde(default)]
        signature: Option<SymbolId>,
    },
    /// `using A.B;`
    Using {
        /// The imported namespace.
        #[serde(default)]
        namespace: Option<SymbolId>,
        /// Span of the imported name.
        name_span: Span,
    },
    /// `new T[n]`
    ArrayCreation {
        /// Explicit element type.
        element: TypeSyntax,
    },
    /// `new[] { ... }`
    ImplicitArrayCreation {
        /// Inferred array type.
        #[serde(default)]
        array_type: Option<SymbolId>,
    },
    /// `default(T)`
    Default {
        /// Expression type.
        #[serde(rename = "type")]
        ty: TypeSyntax,
    },
    /// Any node kind with no usage semantics.
    Other {
        /// Host label for the node kind, for debugging.
        #[serde(default)]
        label: Option<String>,
    },
}

impl NodeKind {
    /// Returns the kebab-case name of this node kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CompilationUnit => "compilation-unit",
            Self::Namespace { .. } => "namespace",
            Self::TypeDeclaration { .. } => "type-declaration",
            Self::Method { .. } => "method",
            Self::Property { .. } => "property",
            Self::Indexer { .. } => "indexer",
            Self::Field { .. } => "field",
            Self::LocalVariable { .. } => "local-variable",
            Self::Parameter { .. } => "parameter",
            Self::BaseList { .. } => "base-list",
            Self::ObjectCreation { .. } => "object-creation",
            Self::Invocation { .. } => "invocation",
            Self::MemberAccess { .. } => "member-access",
            Self::TypeOf { .. } => "type-of",
            Self::Cast { .. } => "cast",
            Self::As { .. } => "as",
            Self::GenericName { .. } => "generic-name",
            Self::Delegate { .. } => "delegate",
            Self::Attribute { .. } => "attribute",
            Self::Lambda { .. } => "lambda",
            Self::Using { .. } => "using",
            Self::ArrayCreation { .. } => "array-creation",
            Self::ImplicitArrayCreation { .. } => "implicit-array-creation",
            Self::Default { .. } => "default",
            Self::Other { .. } => "other",
        }
    }

    /// Returns the symbol a declaration introduces as the containing context
    /// for itself and its descendants.
    #[must_use]
    pub fn declared_context(&self) -> Option<Option<SymbolId>> {
        match self {
            Self::Namespace { symbol, .. }
            | Self::TypeDeclaration { symbol }
            | Self::Method { symbol, .. }
            | Self::Property { symbol, .. }
            | Self::Indexer { symbol, .. }
            | Self::Field { symbol, .. }
            | Self::Delegate { symbol, .. } => Some(*symbol),
            _ => None,
        }
    }
}

/// A node of a symbol-annotated syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// Shape and resolved symbols.
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Span of the whole node.
    #[serde(default)]
    pub span: Span,
    /// Child nodes in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Creates a leaf node.
    #[must_use]
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    /// Appends a child node.
    #[must_use]
    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several child nodes.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = SyntaxNode>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Errors from reading a serialized tree document.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// IO error reading the document.
    #[error("Failed to read tree document {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The document is not a valid tree.
    #[error("Failed to parse tree document {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// A file's syntax tree together with the symbols it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTree {
    /// Source file the tree was parsed from.
    pub file: PathBuf,
    /// Symbols referenced by handles in the tree.
    #[serde(default)]
    pub symbols: SymbolTable,
    /// Root node (normally a compilation unit).
    pub root: SyntaxNode,
    /// Set by the host when the source is generated code.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub generated: bool,
}

/// File name endings that mark generated sources.
const GENERATED_SUFFIXES: &[&str] = &[".g.cs", ".g.i.cs", ".designer.cs", ".generated.cs"];

impl SyntaxTree {
    /// Loads a tree document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid tree.
    pub fn from_file(path: &Path) -> Result<Self, TreeError> {
        let content = std::fs::read_to_string(path).map_err(|e| TreeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| TreeError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Whether the tree comes from generated code, either flagged by the
    /// host or recognized by its file name.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        if self.generated {
            return true;
        }
        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        GENERATED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
    }
}
