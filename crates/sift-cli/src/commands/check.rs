//! Check command implementation.

use anyhow::{Context, Result};
use sift_core::{Analyzer, Config, EditBuffer, LintResult, RuleBox, UnitReport};
use sift_rules::Preset;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config_resolver::Resolved;
use crate::{FixMode, OutputFormat};

/// Runs the check command.
pub fn run(
    path: &Path,
    format: OutputFormat,
    rules_filter: Option<String>,
    exclude: Vec<String>,
    fix_mode: FixMode,
    resolved: Resolved,
) -> Result<()> {
    let Resolved { config, origin } = resolved;
    let threshold = config.fail_threshold();

    let rules = match rules_filter {
        Some(filter) => {
            let keys: Vec<&str> = filter.split(',').map(str::trim).collect();
            filter_rules(&keys, &config)
        }
        None => Preset::from_config(&config).configured_rules(&config),
    };

    let mut builder = Analyzer::builder().root(path).config(config);
    for pattern in exclude {
        builder = builder.exclude(pattern);
    }
    for rule in rules {
        builder = builder.rule_box(rule);
    }

    let analyzer = builder.build().context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {:?} with {} rules ({})",
        path,
        analyzer.rule_count(),
        origin
    );

    let reports = analyzer.analyze_units().context("Analysis failed")?;

    let mut result = LintResult::new();
    let mut sources: HashMap<PathBuf, &str> = HashMap::new();
    for report in &reports {
        sources.insert(report.unit.tree.path().to_path_buf(), report.unit.tree.source());
        result.extend(LintResult {
            diagnostics: report.diagnostics.clone(),
            failures: report.failures.clone(),
            units_checked: 1,
        });
    }

    super::output::print(&result, &sources, format)?;

    let mut remaining = 0;
    let mut fixed_total = 0;
    for report in &reports {
        let fixed = match fix_mode {
            FixMode::Off => HashSet::new(),
            FixMode::Apply => apply_fixes(report, false)?,
            FixMode::DryRun => {
                apply_fixes(report, true)?;
                HashSet::new()
            }
        };
        fixed_total += fixed.len();
        remaining += report
            .diagnostics
            .iter()
            .enumerate()
            .filter(|(i, d)| d.severity >= threshold && !fixed.contains(i))
            .count();
    }
    if fix_mode == FixMode::Apply {
        tracing::info!("Fixed {} issue(s); {} failing left", fixed_total, remaining);
    }

    if remaining > 0 || result.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Picks the configured rules answering to any of `keys`.
fn filter_rules(keys: &[&str], config: &Config) -> Vec<RuleBox> {
    let available = Preset::from_config(config).configured_rules(config);
    for key in keys {
        if !available.iter().any(|rule| rule.answers_to(key)) {
            tracing::warn!("Unknown rule: {}", key);
        }
    }
    available
        .into_iter()
        .filter(|rule| keys.iter().any(|key| rule.answers_to(key)))
        .collect()
}

/// Merges the fixes of one unit and writes (or prints) the result.
///
/// Returns the indices of the diagnostics whose fix was written back.
fn apply_fixes(report: &UnitReport, dry_run: bool) -> Result<HashSet<usize>> {
    let mut buffer = EditBuffer::new();
    let mut taken = HashSet::new();
    for (index, diagnostic) in report.diagnostics.iter().enumerate() {
        if diagnostic.fix.is_empty() {
            continue;
        }
        if buffer.try_add(&diagnostic.fix) {
            taken.insert(index);
        } else {
            tracing::warn!(
                "Skipping fix for {} at {}:{}: overlaps an earlier fix",
                diagnostic.rule,
                diagnostic.location.file.display(),
                diagnostic.location.line
            );
        }
    }
    if buffer.is_empty() {
        return Ok(taken);
    }

    let tree = &report.unit.tree;
    let fixed = buffer
        .apply(tree.source())
        .with_context(|| format!("Failed to apply fixes to {}", tree.path().display()))?;

    if dry_run {
        println!("--- {} (fixed)", tree.path().display());
        print!("{fixed}");
        return Ok(taken);
    }

    match &report.unit.source_file {
        Some(file) => {
            std::fs::write(file, fixed)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            tracing::info!("Fixed {} issue(s) in {}", taken.len(), file.display());
            Ok(taken)
        }
        None => {
            tracing::warn!(
                "{} embeds its source; fixes cannot be written back",
                report.document.display()
            );
            Ok(HashSet::new())
        }
    }
}
