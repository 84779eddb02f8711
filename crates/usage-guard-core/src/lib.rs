//! # usage-guard-core
//!
//! Usage-restriction policy engine over symbol-annotated syntax trees.
//!
//! The host supplies a syntax tree whose nodes carry resolved symbol handles
//! (see [`syntax`] and [`symbol`]). The engine walks the tree, derives usage
//! sites for every syntactic position where a namespace, type, generic
//! argument, delegate or attribute appears, and evaluates them against an
//! immutable [`RuleRegistry`].
//!
//! - [`extractor`] maps node shapes to [`UsageSite`]s
//! - [`policy`] holds the rule model, its TOML loader and the evaluator
//! - [`emitter`] turns findings into [`Diagnostic`]s
//! - [`UsageEngine`] drives a single tree; [`Analyzer`] drives a directory
//!
//! ## Example
//!
//! ```ignore
//! use usage_guard_core::{Analyzer, Config};
//!
//! let (config, registry) = Config::load("usage-guard.toml".as_ref())?;
//! let analyzer = Analyzer::builder()
//!     .config(config)
//!     .registry(registry)
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! for d in &result.diagnostics {
//!     println!("{d}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod engine;
mod presets;
mod types;

pub mod emitter;
pub mod extractor;
pub mod policy;
pub mod site;
pub mod symbol;
pub mod syntax;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError, TREE_SUFFIX};
pub use config::{AnalyzerConfig, CategoryConfig, Config, ConfigError};
pub use emitter::DiagnosticSink;
pub use engine::UsageEngine;
pub use extractor::Scope;
pub use policy::model::{
    ContextMatcher, Descriptor, NamespaceRule, RuleCategory, RuleRegistry, UsageRule, UsedMatcher,
};
pub use policy::{load_registry_from_toml, LoadRulesError};
pub use presets::Preset;
pub use site::{UsageKind, UsageSite};
pub use symbol::{Symbol, SymbolId, SymbolKind, SymbolModel, SymbolTable};
pub use syntax::{NodeKind, Span, SyntaxNode, SyntaxTree, TreeError, TypeSyntax};
pub use types::{AnalysisResult, Diagnostic, Location, Severity};
