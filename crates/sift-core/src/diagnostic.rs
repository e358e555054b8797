//! Findings emitted by rules and the aggregate lint result.

use crate::fix::Fix;
use crate::tree::{NodeId, SyntaxTree, TextRange};
use miette::{NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl Severity {
    /// Parses a lowercase severity name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
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

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Display path of the compilation unit.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in bytes).
    pub column: usize,
    /// Byte offset in the source.
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a location covering `range` of `tree`'s source.
    #[must_use]
    pub fn from_range(tree: &SyntaxTree, range: TextRange) -> Self {
        let (line, column) = tree.line_col(range.start);
        Self {
            file: tree.path().to_path_buf(),
            line,
            column,
            offset: range.start,
            length: range.len(),
        }
    }

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

/// One finding: an anchor node, a message and the edits that correct it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule code (e.g., "SF001").
    pub code: String,
    /// Stable rule identity (e.g., "return-value-ignored").
    pub rule: String,
    /// Severity of this diagnostic.
    pub severity: Severity,
    /// Node the diagnostic is attached to.
    pub anchor: NodeId,
    /// Location of the anchor node.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Short description of what the fix does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Ordered, non-overlapping edits against the original source.
    #[serde(default, skip_serializing_if = "Fix::is_empty")]
    pub fix: Fix,
}

impl Diagnostic {
    /// Creates a diagnostic without a fix.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        anchor: NodeId,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            anchor,
            location,
            message: message.into(),
            help: None,
            fix: Fix::default(),
        }
    }

    /// Attaches a fix.
    #[must_use]
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = fix;
        self
    }

    /// Attaches a help line.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Formats the diagnostic for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.code,
            self.rule,
            self.location.file.display(),
            self.location.line,
            self.location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(help) = &self.help {
            let _ = writeln!(output, "  = help: {help}");
        }
        output
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
            self.code,
            self.message
        )
    }
}

/// A [`Diagnostic`] paired with its source, for rich rendering with miette.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{message}")]
pub struct DiagnosticReport {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
    #[source_code]
    source_code: NamedSource<String>,
}

impl DiagnosticReport {
    /// Builds a report for `diagnostic` over `source`.
    #[must_use]
    pub fn new(diagnostic: &Diagnostic, source: &str) -> Self {
        Self {
            message: format!("[{}] {}", diagnostic.code, diagnostic.message),
            help: diagnostic.help.clone(),
            span: SourceSpan::from((diagnostic.location.offset, diagnostic.location.length)),
            label_message: diagnostic.rule.clone(),
            source_code: NamedSource::new(
                diagnostic.location.file.display().to_string(),
                source.to_string(),
            ),
        }
    }
}

/// Why a rule could not finish evaluating a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The rule reported a broken logic invariant.
    Invariant(String),
    /// The rule panicked.
    Panic(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invariant(detail) => write!(f, "invariant violated: {detail}"),
            Self::Panic(detail) => write!(f, "rule panicked: {detail}"),
        }
    }
}

/// Internal failure of one rule at one node.
///
/// Surfaced to the consumer next to the diagnostics; never reported as a
/// finding about the analyzed code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    /// Stable identity of the failing rule.
    pub rule: String,
    /// Node being evaluated.
    pub node: NodeId,
    /// Location of that node.
    pub location: Location,
    /// What went wrong.
    pub reason: FailureReason,
}

impl std::fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: internal failure in {}: {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.rule,
            self.reason
        )
    }
}

/// Result of running lint analysis over a set of units.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All diagnostics found, ordered by unit then document order.
    pub diagnostics: Vec<Diagnostic>,
    /// Internal rule failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RuleFailure>,
    /// Number of units checked.
    pub units_checked: usize,
}

impl LintResult {
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

    /// Returns true if any rule failed internally.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Counts diagnostics by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |severity| {
            self.diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .count()
        };
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Checks if any diagnostics meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_diagnostics_at(&self, severity: Severity) -> bool {
        self.diagnostics.iter().any(|d| d.severity >= severity)
    }

    /// Formats the summary line.
    #[must_use]
    pub fn summary(&self) -> String {
        let (errors, warnings, infos) = self.count_by_severity();
        let mut summary = format!(
            "Found {} error(s), {} warning(s), {} info(s) in {} unit(s)",
            errors, warnings, infos, self.units_checked
        );
        if !self.failures.is_empty() {
            summary.push_str(&format!("; {} internal failure(s)", self.failures.len()));
        }
        summary
    }

    /// Adds diagnostics and failures from another result.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
        self.failures.extend(other.failures);
        self.units_checked += other.units_checked;
    }
}
