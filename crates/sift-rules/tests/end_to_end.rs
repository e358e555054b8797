//! Integration test: the built-in rule through discovery, suppression and
//! fixing, driven by unit documents on disk.

use sift_core::testing::Fixture;
use sift_core::{Analyzer, EditBuffer, Severity};
use sift_rules::{recommended_rules, ReturnValueIgnored};
use std::path::Path;

const SOURCE: &str = "\
s.trim();
\"literal\".trim();
// sift: allow(return-value-ignored) reason=\"length only\"
s.strip();
n.add(n); // sift: allow(ResultOfMethodCallIgnored)
@Suppress(SF001) { s.intern(); }
s.trim().length();
";

fn fixture() -> Fixture {
    Fixture::java()
        .path("src/Main.java")
        .local("s", "java.lang.String")
        .local("n", "java.math.BigInteger")
}

fn write_unit(root: &Path, name: &str, source: &str) {
    let unit = fixture().parse(source);
    std::fs::write(root.join(name), unit.to_json()).expect("write unit");
}

fn analyzer(root: &Path) -> Analyzer {
    let mut builder = Analyzer::builder().root(root);
    for rule in recommended_rules() {
        builder = builder.rule_box(rule);
    }
    builder.build().expect("analyzer should build")
}

// ── Reporting ──

#[test]
fn reports_unsuppressed_findings_in_document_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_unit(dir.path(), "Main.sift.json", SOURCE);

    let result = analyzer(dir.path()).analyze().expect("analysis should succeed");
    let lines: Vec<String> = result.diagnostics.iter().map(ToString::to_string).collect();

    insta::assert_snapshot!(lines.join("\n"), @r"
    src/Main.java:1:1: error [SF001] Ignored return value of method that has no side-effect
    src/Main.java:2:1: error [SF001] Ignored return value of method that has no side-effect
    src/Main.java:5:1: warning [SF001] Allow directive for 'return-value-ignored' is missing required reason
    ");
    assert!(result.has_errors());
    assert!(result.failures.is_empty());
}

#[test]
fn clean_units_pass() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_unit(dir.path(), "Clean.sift.json", "s = s.trim();\nn = n.negate();\n");

    let result = analyzer(dir.path()).analyze().expect("analysis should succeed");
    assert!(result.diagnostics.is_empty());
    assert!(!result.has_diagnostics_at(Severity::Info));
    assert_eq!(result.units_checked, 1);
}

// ── Fixing ──

#[test]
fn fixes_every_surviving_finding() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_unit(dir.path(), "Main.sift.json", SOURCE);

    let reports = analyzer(dir.path())
        .analyze_units()
        .expect("analysis should succeed");
    let report = &reports[0];

    let mut buffer = EditBuffer::new();
    for diagnostic in &report.diagnostics {
        buffer.try_add(&diagnostic.fix);
    }
    let fixed = buffer
        .apply(report.unit.tree.source())
        .expect("edits are in bounds");

    assert!(fixed.starts_with("s = s.trim();\n\n// sift:"));
    assert!(fixed.ends_with("s.trim().length();\n"));

    // The fixed unit no longer produces errors.
    write_unit(dir.path(), "Main.sift.json", &fixed);
    let again = analyzer(dir.path()).analyze().expect("analysis should succeed");
    assert!(!again.has_errors());
}

#[test]
fn custom_type_sets_flag_project_types() {
    let dir = tempfile::tempdir().expect("tempdir");
    let unit = fixture()
        .local("price", "com.acme.Money")
        .method("com.acme.Money", "plus", "com.acme.Money")
        .parse("price.plus(price);\ns.trim();\n");
    std::fs::write(dir.path().join("Money.sift.json"), unit.to_json()).expect("write unit");

    let result = Analyzer::builder()
        .root(dir.path())
        .rule(ReturnValueIgnored::new().with_types(["com.acme.Money"]))
        .build()
        .expect("analyzer should build")
        .analyze()
        .expect("analysis should succeed");

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].location.line, 1);
}
