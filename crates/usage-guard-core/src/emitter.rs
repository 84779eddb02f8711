//! Diagnostic emission.

use std::path::Path;

use crate::policy::engine::Finding;
use crate::types::{Diagnostic, Location};

/// Receives diagnostics in the order they are produced.
///
/// Passed explicitly into a traversal; the engine holds no reporting channel
/// of its own.
pub trait DiagnosticSink {
    /// Accepts one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Builds the diagnostic for a finding in `file`.
#[must_use]
pub fn to_diagnostic(finding: &Finding<'_>, file: &Path) -> Diagnostic {
    let descriptor = finding.descriptor;
    let location = Location::new(file.to_path_buf(), finding.span.line, finding.span.column)
        .with_span(finding.span.offset, finding.span.length);
    let diagnostic = Diagnostic::new(
        descriptor.id(),
        finding.rule,
        descriptor.severity(),
        location,
        descriptor.render(&finding.used, &finding.context),
    );
    match descriptor.doc_ref() {
        Some(doc) => diagnostic.with_doc_ref(doc),
        None => diagnostic,
    }
}

/// Converts findings to diagnostics and hands them to the sink, in order.
pub fn emit<S: DiagnosticSink + ?Sized>(findings: &[Finding<'_>], file: &Path, sink: &mut S) {
    for finding in findings {
        sink.report(to_diagnostic(finding, file));
    }
}
