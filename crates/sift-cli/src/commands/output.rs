//! Shared output formatting for lint results.

use anyhow::Result;
use sift_core::{Diagnostic, DiagnosticReport, LintResult, Severity};
use std::collections::HashMap;
use std::fmt::Write;
use std::path::PathBuf;

use crate::OutputFormat;

/// Print lint results in the specified format.
///
/// `sources` maps each unit's display path to its source text, for the rich
/// format.
pub fn print(
    result: &LintResult,
    sources: &HashMap<PathBuf, &str>,
    format: OutputFormat,
) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => render_json(result)?,
        OutputFormat::Compact => render_compact(result),
        OutputFormat::Rich => render_rich(result, sources),
    };
    print!("{rendered}");
    Ok(())
}

fn severity_indicator(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Info => "\x1b[34minfo\x1b[0m",
    }
}

fn render_text(result: &LintResult) -> String {
    let (errors, warnings, _) = result.count_by_severity();
    let mut out = String::new();

    for diagnostic in &result.diagnostics {
        let _ = writeln!(
            out,
            "{} {} at {}:{}:{}",
            diagnostic.code,
            diagnostic.rule,
            diagnostic.location.file.display(),
            diagnostic.location.line,
            diagnostic.location.column,
        );
        let _ = writeln!(
            out,
            "  {}: {}",
            severity_indicator(diagnostic.severity),
            diagnostic.message
        );
        if let Some(help) = &diagnostic.help {
            let _ = writeln!(out, "  = help: {help}");
        }
        out.push('\n');
    }

    for failure in &result.failures {
        let _ = writeln!(out, "\x1b[35minternal\x1b[0m {failure}");
    }

    let summary_color = if errors > 0 || result.has_failures() {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };
    let _ = writeln!(out, "{summary_color}{}\x1b[0m", result.summary());
    out
}

fn render_json(result: &LintResult) -> Result<String> {
    let mut json = serde_json::to_string_pretty(result)?;
    json.push('\n');
    Ok(json)
}

fn render_compact(result: &LintResult) -> String {
    let mut out = String::new();
    for diagnostic in &result.diagnostics {
        let _ = writeln!(out, "{diagnostic}");
    }
    for failure in &result.failures {
        let _ = writeln!(out, "{failure}");
    }
    out
}

fn render_rich(result: &LintResult, sources: &HashMap<PathBuf, &str>) -> String {
    let mut out = String::new();
    for diagnostic in &result.diagnostics {
        match sources.get(&diagnostic.location.file) {
            Some(source) => {
                let report = miette::Report::new(DiagnosticReport::new(diagnostic, source));
                let _ = writeln!(out, "{report:?}");
            }
            None => out.push_str(&Diagnostic::format(diagnostic)),
        }
    }
    for failure in &result.failures {
        let _ = writeln!(out, "{failure}");
    }
    let _ = writeln!(out, "{}", result.summary());
    out
}
