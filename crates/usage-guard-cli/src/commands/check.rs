//! Check command implementation.

use anyhow::{Context, Result};
use usage_guard_core::{AnalysisResult, Analyzer};
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Runs the check command.
pub fn run(
    path: &Path,
    format: OutputFormat,
    only: Option<&str>,
    exclude: Vec<String>,
    source: &ConfigSource,
) -> Result<()> {
    let (config, registry) = super::load_config(source)?;

    let analyzer = Analyzer::builder()
        .root(path)
        .config(config)
        .registry(registry)
        .excludes(exclude)
        .build()
        .context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {:?} with {} rules",
        path,
        analyzer.engine().registry().len()
    );

    let mut result = analyzer.analyze().context("Analysis failed")?;
    if let Some(ids) = only {
        retain_ids(&mut result, ids);
    }

    super::output::print(&result, format)?;

    // Exit with error code if there are errors
    if result.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Keeps only diagnostics whose id is in the comma-separated list.
fn retain_ids(result: &mut AnalysisResult, ids: &str) {
    let wanted: Vec<&str> = ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    result
        .diagnostics
        .retain(|d| wanted.iter().any(|id| d.id.eq_ignore_ascii_case(id)));
}
