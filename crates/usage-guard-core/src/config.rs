//! Configuration types for usage-guard.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::policy::engine::DEFAULT_MAX_GENERIC_DEPTH;
use crate::policy::model::RuleRegistry;
use crate::policy::{registry_for_config, LoadRulesError};
use crate::types::Severity;

/// Top-level configuration for usage-guard.
///
/// Rule tables (`[[namespace-rule]]`, `[[usage-rule]]`) live in the same
/// document and are read by [`crate::policy`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Built-in rule set to start from (e.g., "sample").
    #[serde(default)]
    pub preset: Option<String>,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Per-diagnostic-id overrides, keyed by id (e.g., "TU001").
    #[serde(default)]
    pub categories: HashMap<String, CategoryConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::parse(&read(path)?)
    }

    /// Loads configuration and its rule registry from one TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or its rules
    /// fail validation.
    pub fn load(path: &Path) -> Result<(Self, RuleRegistry), ConfigError> {
        let content = read(path)?;
        let config = Self::parse(&content)?;
        let registry = registry_for_config(&config, &content)?;
        Ok((config, registry))
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if diagnostics with this id are reported.
    #[must_use]
    pub fn is_category_enabled(&self, id: &str) -> bool {
        self.categories
            .get(id)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a diagnostic id.
    #[must_use]
    pub fn category_severity(&self, id: &str) -> Option<Severity> {
        self.categories.get(id).and_then(|c| c.severity)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory holding tree documents (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from analysis.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Maximum nesting depth of generic arguments to check.
    #[serde(default = "default_max_generic_depth")]
    pub max_generic_depth: usize,

    /// Maximum number of parallel file analyses.
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Whether generated sources are checked too (default: false).
    #[serde(default)]
    pub analyze_generated: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: Vec::new(),
            max_generic_depth: DEFAULT_MAX_GENERIC_DEPTH,
            parallelism: None,
            analyze_generated: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_generic_depth() -> usize {
    DEFAULT_MAX_GENERIC_DEPTH
}

/// Per-category configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Whether diagnostics of this category are reported.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this category.
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// Rule tables failed to load.
    #[error("Invalid rules: {0}")]
    Rules(#[from] LoadRulesError),
}
