//! Core types for policy diagnostics and analysis results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail the check.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl Severity {
    /// Parses a lowercase severity name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location of a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path as reported by the host.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in file.
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }
}

/// A policy violation found during analysis.
///
/// Diagnostics own all of their data and stay valid after the tree and
/// symbol table they were produced from are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic id (e.g., "NS001").
    pub id: String,
    /// Name of the rule that fired (e.g., "no-system-in-product").
    pub rule: String,
    /// Severity of this diagnostic.
    pub severity: Severity,
    /// Location of the offending syntactic occurrence.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Reference to a design document (e.g., "ARCHITECTURE.md L85").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ref: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rule: rule.into(),
            severity,
            location,
            message: message.into(),
            doc_ref: None,
        }
    }

    /// Adds a design document reference to this diagnostic.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.doc_ref = Some(doc_ref.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.id,
            self.message
        )?;
        if let Some(doc_ref) = &self.doc_ref {
            write!(f, " (see: {doc_ref})")?;
        }
        Ok(())
    }
}

/// Result of running an analysis pass.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// All diagnostics found, in emission order.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of tree documents checked.
    pub files_checked: usize,
}

impl AnalysisResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns diagnostics with the given id.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.id == id).collect()
    }

    /// Counts diagnostics by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        self.diagnostics
            .iter()
            .fold((0, 0, 0), |(e, w, i), d| match d.severity {
                Severity::Error => (e + 1, w, i),
                Severity::Warning => (e, w + 1, i),
                Severity::Info => (e, w, i + 1),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_diagnostic(severity: Severity) -> Diagnostic {
        Diagnostic::new(
            "TU001",
            "no-forbidden-type",
            severity,
            Location::new(PathBuf::from("src/Restricted.cs"), 12, 9),
            "Usage of type 'ForbiddenType' is not allowed in 'field'",
        )
    }

    #[test]
    fn severity_parse_round_trips_display() {
        for s in [Severity::Info, Severity::Warning, Severity::Error] {
            assert_eq!(Severity::parse(&s.to_string()), Some(s));
        }
        assert_eq!(Severity::parse("fatal"), None);
    }

    #[test]
    fn display_is_compact_one_liner() {
        let d = make_diagnostic(Severity::Error);
        insta::assert_snapshot!(
            d.to_string(),
            @"src/Restricted.cs:12:9: error [TU001] Usage of type 'ForbiddenType' is not allowed in 'field'"
        );
    }

    #[test]
    fn display_includes_doc_ref() {
        let d = make_diagnostic(Severity::Error).with_doc_ref("ARCH.md L10");
        assert!(d.to_string().ends_with("(see: ARCH.md L10)"));
    }

    #[test]
    fn counts_by_severity() {
        let mut result = AnalysisResult::new();
        result.diagnostics.push(make_diagnostic(Severity::Warning));
        result.diagnostics.push(make_diagnostic(Severity::Info));
        assert_eq!(result.count_by_severity(), (0, 1, 1));
        assert!(!result.has_errors());
        assert_eq!(result.by_id("TU001").len(), 2);
    }
}
