//! Init command implementation.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "sift.toml";

const DEFAULT_CONFIG: &str = r#"# sift configuration

# Rule preset: "recommended" (default), "strict" or "minimal"
preset = "recommended"

# Lowest severity that fails the run
fail_on = "error"

[analyzer]
# Glob patterns selecting unit documents
include = ["**/*.sift.json"]

# Glob patterns to exclude from analysis
exclude = [
    "**/target/**",
    "**/build/**",
]

# Respect .gitignore files
respect_gitignore = true

# Worker threads (default: one per CPU)
# parallelism = 4

# Abort when a unit document cannot be loaded
fail_on_unit_error = false

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.return-value-ignored]
enabled = true
# severity = "warning"
types = [
    "java.lang.String",
    "java.math.BigInteger",
    "java.math.BigDecimal",
]
self_keyword = "this"
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let path = run_in(Path::new("."), force)?;

    println!("Created {}", path.display());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to configure rules");
    println!("  2. Run: sift check");

    Ok(())
}

/// Writes the default configuration into `dir`.
fn run_in(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::{Config, Severity};

    #[test]
    fn default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).expect("default config is valid");
        assert_eq!(config.preset.as_deref(), Some("recommended"));
        assert_eq!(config.fail_threshold(), Severity::Error);
        assert!(config.is_rule_enabled("return-value-ignored"));

        let section = config.rule("return-value-ignored").expect("rule section");
        assert_eq!(section.get_str("self_keyword", ""), "this");
        assert_eq!(section.get_str_array("types").map(|t| t.len()), Some(3));
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "preset = \"strict\"\n").unwrap();

        let err = run_in(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        let kept = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(kept, "preset = \"strict\"\n");

        run_in(dir.path(), true).unwrap();
        let written = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(written, DEFAULT_CONFIG);
    }
}
