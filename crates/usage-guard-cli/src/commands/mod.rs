//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod list_rules;
pub mod output;

use anyhow::{Context, Result};
use usage_guard_core::{Config, RuleRegistry};

use crate::config_resolver::ConfigSource;

/// Loads the configuration and rule registry for a resolved source.
pub fn load_config(source: &ConfigSource) -> Result<(Config, RuleRegistry)> {
    match source {
        ConfigSource::Default => {
            tracing::info!("No configuration found; no rules are active");
            Ok((Config::default(), RuleRegistry::empty()))
        }
        other => {
            // Non-default sources always carry a path.
            let p = other.path().context("resolved config has no path")?;
            if source.is_global() {
                tracing::info!("Using global config: {}", p.display());
            }
            Config::load(p).with_context(|| format!("Failed to load config: {}", p.display()))
        }
    }
}
