//! Core analyzer for orchestrating checks over tree documents.

use crate::config::Config;
use crate::engine::UsageEngine;
use crate::policy::model::RuleRegistry;
use crate::syntax::{SyntaxTree, TreeError};
use crate::types::{AnalysisResult, Diagnostic};

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// File suffix of serialized tree documents.
pub const TREE_SUFFIX: &str = ".ast.json";

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error while setting up the analyzer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A tree document could not be read or parsed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Directory walk failed.
    #[error("Failed to walk {root}: {source}")]
    Walk {
        /// Root being walked.
        root: PathBuf,
        /// Underlying walk error.
        source: ignore::Error,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Worker pool could not be created.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    registry: Option<Arc<RuleRegistry>>,
    exclude_patterns: Vec<String>,
    config: Option<Config>,
    parallelism: Option<usize>,
    fail_on_parse_error: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Sets the rule registry shared by every pass.
    #[must_use]
    pub fn registry(mut self, registry: impl Into<Arc<RuleRegistry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the number of worker threads (default: from config, else rayon's).
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Sets whether to fail on unreadable tree documents (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory is unavailable or an
    /// exclude pattern is invalid.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();
        let root = self.root.unwrap_or_else(|| config.analyzer.root.clone());
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let excludes = self
            .exclude_patterns
            .iter()
            .chain(&config.analyzer.exclude)
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let registry = self.registry.unwrap_or_default();
        let engine = UsageEngine::new(registry)
            .with_max_generic_depth(config.analyzer.max_generic_depth);

        Ok(Analyzer {
            root,
            engine,
            excludes,
            parallelism: self.parallelism.or(config.analyzer.parallelism),
            config,
            fail_on_parse_error: self.fail_on_parse_error,
        })
    }
}

/// The main analyzer: discovers tree documents and checks them in parallel.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    engine: UsageEngine,
    excludes: Vec<glob::Pattern>,
    parallelism: Option<usize>,
    config: Config,
    fail_on_parse_error: bool,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the engine used for every document.
    #[must_use]
    pub fn engine(&self) -> &UsageEngine {
        &self.engine
    }

    /// Analyzes all tree documents under the root.
    ///
    /// Files are checked in parallel; diagnostics are grouped by file in
    /// sorted path order and keep usage-site order within a file. Generated
    /// sources are not counted as checked.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails, or if a document is unreadable
    /// and `fail_on_parse_error` is set.
    pub fn analyze(&self) -> Result<AnalysisResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let files = self.discover_files()?;
        info!("Found {} tree documents to analyze", files.len());

        let outcomes = match self.parallelism {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?
                .install(|| self.check_all(&files)),
            None => self.check_all(&files),
        };

        let mut result = AnalysisResult::new();
        for outcome in outcomes {
            match outcome {
                Ok(None) => {}
                Ok(Some(diagnostics)) => {
                    result
                        .diagnostics
                        .extend(self.apply_category_overrides(diagnostics));
                    result.files_checked += 1;
                }
                Err(e) => {
                    warn!("Skipping tree document: {e}");
                    if self.fail_on_parse_error {
                        return Err(e.into());
                    }
                }
            }
        }

        info!(
            "Analysis complete: {} diagnostics in {} files",
            result.diagnostics.len(),
            result.files_checked
        );

        Ok(result)
    }

    /// Analyzes already-loaded trees, in the given order.
    ///
    /// Generated sources are skipped unless `analyze_generated` is set.
    #[must_use]
    pub fn analyze_trees(&self, trees: &[SyntaxTree]) -> AnalysisResult {
        let per_file: Vec<Option<Vec<Diagnostic>>> =
            trees.par_iter().map(|t| self.check_tree(t)).collect();
        let mut result = AnalysisResult::new();
        for diagnostics in per_file.into_iter().flatten() {
            result
                .diagnostics
                .extend(self.apply_category_overrides(diagnostics));
            result.files_checked += 1;
        }
        result
    }

    fn check_all(&self, files: &[PathBuf]) -> Vec<Result<Option<Vec<Diagnostic>>, TreeError>> {
        files
            .par_iter()
            .map(|path| self.check_file(path))
            .collect()
    }

    fn check_file(&self, path: &Path) -> Result<Option<Vec<Diagnostic>>, TreeError> {
        debug!("Analyzing: {}", path.display());
        let tree = SyntaxTree::from_file(path)?;
        Ok(self.check_tree(&tree))
    }

    /// Returns `None` for generated sources unless they are configured in.
    fn check_tree(&self, tree: &SyntaxTree) -> Option<Vec<Diagnostic>> {
        if !self.config.analyzer.analyze_generated && tree.is_generated() {
            debug!("Skipping generated source: {}", tree.file.display());
            return None;
        }
        Some(self.engine.diagnostics(tree))
    }

    /// Drops disabled categories and applies severity overrides.
    fn apply_category_overrides(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|d| {
                let enabled = self.config.is_category_enabled(&d.id);
                if !enabled {
                    debug!("Dropping disabled category {}", d.id);
                }
                enabled
            })
            .map(|mut d| {
                if let Some(severity) = self.config.category_severity(&d.id) {
                    d.severity = severity;
                }
                d
            })
            .collect()
    }

    /// Discovers all tree documents to analyze, sorted by path.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder.hidden(false).git_ignore(true).require_git(false);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry.map_err(|e| AnalyzerError::Walk {
                root: self.root.clone(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() || !path.to_string_lossy().ends_with(TREE_SUFFIX) {
                continue;
            }
            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Checks a path against the exclude globs, relative to the root.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.excludes
            .iter()
            .any(|p| p.matches_path(relative) || p.matches_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let analyzer = Analyzer::builder()
            .root(".")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.root().exists());
        assert!(analyzer.engine().registry().is_empty());
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = Analyzer::builder()
            .root("/repo")
            .exclude("generated/**")
            .exclude("**/vendor/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude(Path::new("/repo/generated/a.ast.json")));
        assert!(analyzer.should_exclude(Path::new("/repo/x/vendor/lib.ast.json")));
        assert!(!analyzer.should_exclude(Path::new("/repo/src/lib.ast.json")));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let err = Analyzer::builder()
            .root(".")
            .exclude("[")
            .build()
            .err()
            .expect("pattern must be rejected");
        assert!(matches!(err, AnalyzerError::Glob(_)));
    }

    #[test]
    fn test_category_overrides() {
        let config = Config::parse(
            r#"
[categories.GT001]
enabled = false

[categories.TU001]
severity = "info"
"#,
        )
        .unwrap();
        let analyzer = Analyzer::builder().root(".").config(config).build().unwrap();

        let location = crate::types::Location::new(PathBuf::from("a.cs"), 1, 1);
        let diagnostics = vec![
            Diagnostic::new("TU001", "r1", crate::Severity::Error, location.clone(), "m"),
            Diagnostic::new("GT001", "r2", crate::Severity::Error, location.clone(), "m"),
            Diagnostic::new("NS001", "r3", crate::Severity::Error, location, "m"),
        ];
        let kept = analyzer.apply_category_overrides(diagnostics);
        let summary: Vec<(&str, crate::Severity)> =
            kept.iter().map(|d| (d.id.as_str(), d.severity)).collect();
        assert_eq!(
            summary,
            [
                ("TU001", crate::Severity::Info),
                ("NS001", crate::Severity::Error)
            ]
        );
    }
}
