//! Core analyzer for orchestrating lint execution.

use crate::config::{Config, DEFAULT_INCLUDE};
use crate::diagnostic::{Diagnostic, LintResult, RuleFailure};
use crate::rule::{Rule, RuleBox, RuleRegistry};
use crate::suppression::{find_suppression, missing_reason, Suppression};
use crate::unit::{Unit, UnitError};

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error resolving paths.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error walking the directory tree.
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// A unit document could not be loaded.
    #[error("Invalid unit {path}: {source}")]
    Unit {
        /// Path to the unit document.
        path: PathBuf,
        /// What was wrong with it.
        source: UnitError,
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

/// Findings for one unit after severity overrides and suppression.
#[derive(Debug)]
pub struct UnitReport {
    /// Path of the unit document, or the tree path for in-memory units.
    pub document: PathBuf,
    /// The analyzed unit; its source is what fixes apply to.
    pub unit: Unit,
    /// Surviving diagnostics in document order.
    pub diagnostics: Vec<Diagnostic>,
    /// Internal rule failures.
    pub failures: Vec<RuleFailure>,
    /// Number of diagnostics removed by suppressions.
    pub suppressed: usize,
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    include_patterns: Vec<String>,
    config: Option<Config>,
    fail_on_unit_error: Option<bool>,
    parallelism: Option<usize>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to search for unit documents.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
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

    /// Adds an include glob pattern.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets whether a unit that fails to load aborts the run.
    #[must_use]
    pub fn fail_on_unit_error(mut self, fail: bool) -> Self {
        self.fail_on_unit_error = Some(fail);
        self
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Builds the analyzer.
    ///
    /// Rules disabled in the configuration are left out of the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be resolved or a
    /// glob pattern is invalid.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();

        let root = self
            .root
            .unwrap_or_else(|| config.analyzer.root.clone());
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());

        let mut include_patterns = self.include_patterns;
        if include_patterns.is_empty() {
            include_patterns.extend(config.analyzer.include.iter().cloned());
        }
        if include_patterns.is_empty() {
            include_patterns.push(DEFAULT_INCLUDE.to_string());
        }

        let registry = self
            .rules
            .into_iter()
            .filter(|rule| {
                let enabled = config.is_rule_enabled(rule.name());
                if !enabled {
                    debug!("Skipping disabled rule: {}", rule.name());
                }
                enabled
            })
            .collect();

        Ok(Analyzer {
            root,
            registry,
            exclude: compile(&exclude_patterns)?,
            include: compile(&include_patterns)?,
            fail_on_unit_error: self
                .fail_on_unit_error
                .unwrap_or(config.analyzer.fail_on_unit_error),
            parallelism: self.parallelism.or(config.analyzer.parallelism),
            config,
        })
    }
}

fn compile(patterns: &[String]) -> Result<Vec<glob::Pattern>, AnalyzerError> {
    patterns
        .iter()
        .map(|p| glob::Pattern::new(p).map_err(AnalyzerError::from))
        .collect()
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    registry: RuleRegistry,
    exclude: Vec<glob::Pattern>,
    include: Vec<glob::Pattern>,
    config: Config,
    fail_on_unit_error: bool,
    parallelism: Option<usize>,
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

    /// Returns the rules this analyzer runs.
    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns the configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyzes all unit documents under the root and merges the results.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails, or if a unit fails to load and
    /// `fail_on_unit_error` is set.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        let reports = self.analyze_units()?;
        let mut result = LintResult::new();
        for report in reports {
            result.diagnostics.extend(report.diagnostics);
            result.failures.extend(report.failures);
            result.units_checked += 1;
        }

        info!(
            "Analysis complete: {} diagnostics in {} units",
            result.diagnostics.len(),
            result.units_checked
        );
        Ok(result)
    }

    /// Analyzes all unit documents under the root, one report per unit,
    /// ordered by document path.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails, or if a unit fails to load and
    /// `fail_on_unit_error` is set.
    pub fn analyze_units(&self) -> Result<Vec<UnitReport>, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let paths = self.discover_units()?;
        info!("Found {} units to analyze", paths.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism.unwrap_or(0))
            .build()?;
        let loaded: Vec<(PathBuf, Result<UnitReport, UnitError>)> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| (path.clone(), self.analyze_path(path)))
                .collect()
        });

        let mut reports = Vec::with_capacity(loaded.len());
        for (path, outcome) in loaded {
            match outcome {
                Ok(report) => reports.push(report),
                Err(source) => {
                    warn!("Failed to load {}: {}", path.display(), source);
                    if self.fail_on_unit_error {
                        return Err(AnalyzerError::Unit { path, source });
                    }
                }
            }
        }

        reports.sort_by(|a, b| a.document.cmp(&b.document));
        Ok(reports)
    }

    fn analyze_path(&self, path: &Path) -> Result<UnitReport, UnitError> {
        debug!("Analyzing: {}", path.display());
        let unit = Unit::load(path)?;
        let mut report = self.analyze_unit(unit);
        report.document = path.to_path_buf();
        Ok(report)
    }

    /// Scans one unit and applies severity overrides and suppressions.
    #[must_use]
    pub fn analyze_unit(&self, unit: Unit) -> UnitReport {
        let scan = unit.scan(&self.registry);
        let mut diagnostics = Vec::with_capacity(scan.diagnostics.len());
        let mut suppressed = 0;

        for mut diagnostic in scan.diagnostics {
            let Some(rule) = self.registry.get(&diagnostic.rule) else {
                diagnostics.push(diagnostic);
                continue;
            };

            match find_suppression(&unit.tree, &diagnostic, rule) {
                Some(Suppression::Annotation(node)) => {
                    debug!(
                        "Suppressed {} at {} by annotation on {}",
                        rule.name(),
                        diagnostic.location.line,
                        node
                    );
                    suppressed += 1;
                }
                Some(Suppression::Comment { reason }) => {
                    suppressed += 1;
                    if reason.is_none() && rule.requires_allow_reason() {
                        diagnostics.push(missing_reason(
                            rule,
                            diagnostic.anchor,
                            diagnostic.location,
                        ));
                    }
                }
                None => {
                    if let Some(severity) = self.config.rule_severity(rule.name()) {
                        diagnostic.severity = severity;
                    }
                    diagnostics.push(diagnostic);
                }
            }
        }

        UnitReport {
            document: unit.tree.path().to_path_buf(),
            unit,
            diagnostics,
            failures: scan.failures,
            suppressed,
        }
    }

    /// Discovers unit documents under the root, sorted by path.
    fn discover_units(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(self.config.analyzer.respect_gitignore)
            .require_git(false);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if !self.include.iter().any(|p| p.matches_path(relative)) {
                continue;
            }
            if self.should_exclude(relative) {
                debug!("Excluding: {}", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Checks if a root-relative path should be excluded.
    fn should_exclude(&self, relative: &Path) -> bool {
        self.exclude.iter().any(|p| p.matches_path(relative))
    }
}
