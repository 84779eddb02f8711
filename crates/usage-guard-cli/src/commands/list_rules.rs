//! List rules command implementation.

use anyhow::Result;
use usage_guard_core::{Preset, RuleCategory};

use crate::config_resolver::ConfigSource;

/// Runs the list-rules command.
pub fn run(source: &ConfigSource) -> Result<()> {
    println!("Rule categories:\n");
    println!("{:<8} {:<12} Title", "Id", "Category");
    println!("{}", "-".repeat(60));
    for category in RuleCategory::ALL {
        println!(
            "{:<8} {:<12} {}",
            category.default_id(),
            category.name(),
            category.title()
        );
    }

    let (_, registry) = super::load_config(source)?;

    println!("\nConfigured rules:\n");
    if registry.is_empty() {
        println!("  (none)");
    }
    for rule in registry.namespace_rules() {
        println!(
            "  {:<8} {:<40} `{}*` inside `{}*`",
            rule.descriptor().id(),
            rule.name(),
            rule.forbidden_prefix(),
            rule.outer_prefix()
        );
    }
    for rule in registry.usage_rules() {
        println!(
            "  {:<8} {:<40} {} in {}",
            rule.descriptor().id(),
            rule.name(),
            rule.used(),
            rule.context()
        );
    }

    println!("\nPresets:");
    for preset in Preset::ALL {
        println!("  {}", preset.name());
    }

    println!("\nUse --only to filter reported ids, e.g.:");
    println!("  usage-guard check --only NS001,TU001");

    Ok(())
}
