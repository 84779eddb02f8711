//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# usage-guard configuration

# Start from the built-in sample policies
preset = "sample"

[analyzer]
# Directory holding *.ast.json tree documents (default: current directory)
# root = "./trees"

# Glob patterns to exclude, relative to root
exclude = [
    "**/generated/**",
]

# Bound on nested generic argument checks
# max_generic_depth = 32

# Check generated sources (*.g.cs, *.designer.cs, or flagged by the host)
# analyze_generated = false

# Per-category overrides, keyed by diagnostic id
# [categories.GT001]
# enabled = false
#
# [categories.TU001]
# severity = "warning"

# Namespaces starting with `forbidden` may not appear inside namespaces
# starting with `outer`
# [[namespace-rule]]
# name = "no-microsoft-in-core"
# outer = "Company.Core"
# forbidden = "Microsoft"

# Types matching `used` may not appear in contexts matching `context`.
# context: declaring-type | name | namespace-prefix (omit for any)
# used:    name | namespace-prefix (omit for any)
# [[usage-rule]]
# name = "no-io-in-domain"
# category = "type"
# context = { namespace-prefix = "Company.Domain" }
# used = { namespace-prefix = "System.IO" }
# doc = "docs/architecture.md"
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("usage-guard.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;

    println!("Created usage-guard.toml");
    println!("\nNext steps:");
    println!("  1. Edit usage-guard.toml to configure rules");
    println!("  2. Export *.ast.json tree documents from your build");
    println!("  3. Run: usage-guard check");

    Ok(())
}
