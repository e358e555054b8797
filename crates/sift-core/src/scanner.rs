//! Single-pass traversal that dispatches every node to every rule.

use crate::diagnostic::{Diagnostic, FailureReason, Location, RuleFailure};
use crate::resolve::TypeResolver;
use crate::rule::{Description, Rule, RuleRegistry, Verdict};
use crate::state::VisitorState;
use crate::tree::{NodeId, SyntaxTree};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Diagnostics and internal failures produced by one scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Findings in document order; rules in registration order per node.
    pub diagnostics: Vec<Diagnostic>,
    /// Rule evaluations that could not complete.
    pub failures: Vec<RuleFailure>,
}

enum Step {
    Enter(NodeId),
    Exit,
}

/// Visits every node of `tree` once in pre-order and evaluates every rule
/// of `registry` at it.
///
/// Matching never prunes the walk. Each `(node, rule)` evaluation is
/// isolated: an invariant violation or a panic inside one rule becomes a
/// [`RuleFailure`] and the scan continues with the next rule.
#[must_use]
pub fn scan(tree: &SyntaxTree, types: &dyn TypeResolver, registry: &RuleRegistry) -> ScanReport {
    let mut report = ScanReport::default();
    let mut state = VisitorState::new(tree, types);
    let mut stack = vec![Step::Enter(tree.root())];
    let mut visited = 0usize;

    while let Some(step) = stack.pop() {
        let node = match step {
            Step::Enter(node) => node,
            Step::Exit => {
                state.exit();
                continue;
            }
        };

        state.enter(node);
        visited += 1;
        for rule in registry.iter() {
            evaluate(rule, node, &state, &mut report);
        }

        stack.push(Step::Exit);
        stack.extend(tree.children(node).iter().rev().map(|&child| Step::Enter(child)));
    }

    debug!(
        "Scanned {} ({} nodes): {} diagnostic(s), {} failure(s)",
        tree.path().display(),
        visited,
        report.diagnostics.len(),
        report.failures.len()
    );
    report
}

fn evaluate(rule: &dyn Rule, node: NodeId, state: &VisitorState<'_>, report: &mut ScanReport) {
    let tree = state.tree();
    let outcome = catch_unwind(AssertUnwindSafe(|| rule.check(node, state)));

    let reason = match outcome {
        Ok(Verdict::NoMatch) => return,
        Ok(Verdict::Match(description)) => match to_diagnostic(rule, tree, description) {
            Ok(diagnostic) => {
                report.diagnostics.push(diagnostic);
                return;
            }
            Err(detail) => FailureReason::Invariant(detail),
        },
        Ok(Verdict::Violation(violation)) => FailureReason::Invariant(violation.to_string()),
        Err(payload) => FailureReason::Panic(panic_message(payload.as_ref())),
    };

    warn!(
        "Rule {} failed at {} in {}: {}",
        rule.name(),
        node,
        tree.path().display(),
        reason
    );
    report.failures.push(RuleFailure {
        rule: rule.name().to_string(),
        node,
        location: Location::from_range(tree, tree.range(node)),
        reason,
    });
}

fn to_diagnostic(
    rule: &dyn Rule,
    tree: &SyntaxTree,
    description: Description,
) -> Result<Diagnostic, String> {
    let anchor = tree
        .get(description.anchor)
        .ok_or_else(|| format!("anchor {} is not part of the tree", description.anchor))?;
    let fix = description
        .fix
        .seal()
        .map_err(|e| format!("invalid fix: {e}"))?;

    let diagnostic = Diagnostic::new(
        rule.code(),
        rule.name(),
        rule.default_severity(),
        description.anchor,
        Location::from_range(tree, anchor.range),
        description.message,
    )
    .with_fix(fix);

    Ok(match description.help {
        Some(help) => diagnostic.with_help(help),
        None => diagnostic,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::SuggestedFix;
    use crate::rule::{InvariantViolation, RuleBox};
    use crate::testing::Fixture;
    use crate::tree::{Kind, TextRange};
    use std::sync::{Arc, Mutex};

    /// Reports every node of one kind.
    struct Flag(Kind);

    impl Rule for Flag {
        fn name(&self) -> &'static str {
            "flag"
        }
        fn code(&self) -> &'static str {
            "T001"
        }
        fn check(&self, node: NodeId, state: &VisitorState<'_>) -> Verdict {
            if state.tree().kind(node) == self.0 {
                Verdict::Match(Description::new(node, state.source_for(node)))
            } else {
                Verdict::NoMatch
            }
        }
    }

    /// Records the path depth at every visit.
    struct Recorder(Arc<Mutex<Vec<(NodeId, usize)>>>);

    impl Rule for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }
        fn code(&self) -> &'static str {
            "T002"
        }
        fn check(&self, node: NodeId, state: &VisitorState<'_>) -> Verdict {
            if let Ok(mut seen) = self.0.lock() {
                seen.push((node, state.path().len()));
            }
            Verdict::NoMatch
        }
    }

    /// Panics on identifiers, reports a violation on literals.
    struct Broken;

    impl Rule for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn code(&self) -> &'static str {
            "T003"
        }
        fn check(&self, node: NodeId, state: &VisitorState<'_>) -> Verdict {
            match state.tree().kind(node) {
                Kind::Identifier => panic!("identifiers are not supported"),
                Kind::Literal => Verdict::Violation(InvariantViolation::new(node, "literal")),
                _ => Verdict::NoMatch,
            }
        }
    }

    /// Proposes overlapping edits for every statement.
    struct Overlapping;

    impl Rule for Overlapping {
        fn name(&self) -> &'static str {
            "overlapping"
        }
        fn code(&self) -> &'static str {
            "T004"
        }
        fn check(&self, node: NodeId, state: &VisitorState<'_>) -> Verdict {
            if state.tree().kind(node) != Kind::ExpressionStatement {
                return Verdict::NoMatch;
            }
            let range = state.tree().range(node);
            let fix = SuggestedFix::new()
                .delete(range)
                .replace(TextRange::new(range.start, range.start + 1), "x");
            Verdict::Match(Description::new(node, "overlap").with_fix(fix))
        }
    }

    fn registry(rules: Vec<RuleBox>) -> RuleRegistry {
        RuleRegistry::new(rules)
    }

    #[test]
    fn visits_every_node_once_in_document_order() {
        let unit = Fixture::java()
            .local("s", "java.lang.String")
            .parse("s.trim(); s.length();");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let rules = registry(vec![Box::new(Recorder(Arc::clone(&seen)))]);
        let report = scan(&unit.tree, &unit.types, &rules);
        assert!(report.diagnostics.is_empty());

        let mut expected = Vec::new();
        let mut stack = vec![(unit.tree.root(), 1)];
        while let Some((node, depth)) = stack.pop() {
            expected.push((node, depth));
            for &child in unit.tree.children(node).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        assert_eq!(expected.len(), unit.tree.len());

        let seen = seen.lock().expect("not poisoned").clone();
        assert_eq!(seen, expected);
    }

    #[test]
    fn matches_do_not_prune_descendants() {
        let unit = Fixture::java()
            .local("s", "java.lang.String")
            .parse("s.trim().trim();");
        let report = scan(
            &unit.tree,
            &unit.types,
            &registry(vec![Box::new(Flag(Kind::MethodInvocation))]),
        );
        let texts: Vec<_> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(texts, ["s.trim().trim()", "s.trim()"]);
    }

    #[test]
    fn rules_run_in_registration_order_per_node() {
        let unit = Fixture::java()
            .local("s", "java.lang.String")
            .parse("s.trim();");
        let report = scan(
            &unit.tree,
            &unit.types,
            &registry(vec![
                Box::new(Flag(Kind::ExpressionStatement)),
                Box::new(Overlapping),
            ]),
        );
        let rules: Vec<_> = report.diagnostics.iter().map(|d| d.rule.as_str()).collect();
        assert_eq!(rules, ["flag"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].rule, "overlapping");
        assert!(matches!(
            &report.failures[0].reason,
            FailureReason::Invariant(detail) if detail.starts_with("invalid fix")
        ));
    }

    #[test]
    fn failures_are_isolated_per_node_and_rule() {
        let unit = Fixture::java()
            .local("s", "java.lang.String")
            .parse("s.trim(); \"x\".trim();");
        let report = scan(
            &unit.tree,
            &unit.types,
            &registry(vec![
                Box::new(Broken),
                Box::new(Flag(Kind::MethodInvocation)),
            ]),
        );

        assert_eq!(report.diagnostics.len(), 2);
        let panics = report
            .failures
            .iter()
            .filter(|f| matches!(f.reason, FailureReason::Panic(_)))
            .count();
        let invariants = report
            .failures
            .iter()
            .filter(|f| matches!(f.reason, FailureReason::Invariant(_)))
            .count();
        assert_eq!(panics, 1);
        assert_eq!(invariants, 1);
        assert!(report
            .failures
            .iter()
            .any(|f| f.reason == FailureReason::Panic("identifiers are not supported".into())));
    }

    #[test]
    fn scanning_is_deterministic() {
        let unit = Fixture::java()
            .local("s", "java.lang.String")
            .parse("s.trim(); s.trim().length(); s.isEmpty();");
        let rules = registry(vec![Box::new(Flag(Kind::MethodInvocation))]);
        let first = scan(&unit.tree, &unit.types, &rules);
        let second = scan(&unit.tree, &unit.types, &rules);
        let key = |r: &ScanReport| {
            r.diagnostics
                .iter()
                .map(|d| (d.anchor, d.message.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&first), key(&second));
        assert_eq!(first.diagnostics.len(), 4);
    }
}
