//! Opting program elements out of rules.
//!
//! Two mechanisms are honored, both applied to finished diagnostics:
//!
//! - `suppress` annotations the front end attached to a node, which cover
//!   the node and everything below it;
//! - comment directives on the flagged line or the line before:
//!
//! ```text
//! // sift: allow(return-value-ignored) reason="value only logged"
//! ```
//!
//! A rule is named by its name, code or any alt name; `all` names every rule.

use crate::diagnostic::{Diagnostic, Location, Severity};
use crate::rule::Rule;
use crate::tree::{NodeId, SyntaxTree};
use std::collections::HashSet;

const EVERY_RULE: &str = "all";

/// Result of checking for allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Rule is not allowed.
    Denied,
    /// Rule is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
pub struct AllowDirective {
    /// Rule names that are allowed.
    pub rules: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

/// How a diagnostic was suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suppression {
    /// An enclosing node carries a `suppress` annotation for the rule.
    Annotation(NodeId),
    /// A comment directive allows the rule on this line.
    Comment {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

/// Checks source text for allow directives naming `rule` on `line` or the
/// line before. A directive may trail code on the flagged line; on the line
/// before it must stand on a comment line of its own.
///
/// # Arguments
///
/// * `content` - Source code content
/// * `line` - Line number to check (1-indexed)
/// * `rule` - Rule whose identities are looked for
#[must_use]
pub fn check_allow_with_reason(content: &str, line: usize, rule: &dyn Rule) -> AllowCheck {
    let lines: Vec<&str> = content.lines().collect();

    for check_line in [line.saturating_sub(1), line] {
        if check_line == 0 || check_line > lines.len() {
            continue;
        }
        let text = lines[check_line - 1];
        // A directive trailing code covers that line only.
        if check_line != line && !is_comment_line(text) {
            continue;
        }

        if let Some(directive) = parse_allow_directive(text) {
            if directive
                .rules
                .iter()
                .any(|key| key == EVERY_RULE || rule.answers_to(key))
            {
                return AllowCheck::Allowed {
                    reason: directive.reason,
                };
            }
        }
    }

    AllowCheck::Denied
}

/// Returns the innermost node at or above `anchor` whose annotations name
/// `rule`.
#[must_use]
pub fn annotated_suppression(tree: &SyntaxTree, anchor: NodeId, rule: &dyn Rule) -> Option<NodeId> {
    tree.ancestors(anchor).find(|&node| {
        tree.node(node)
            .suppressions
            .iter()
            .any(|key| key == EVERY_RULE || rule.answers_to(key))
    })
}

/// Decides whether `diagnostic`, produced by `rule` over `tree`, is
/// suppressed. Annotations take precedence over comments.
#[must_use]
pub fn find_suppression(
    tree: &SyntaxTree,
    diagnostic: &Diagnostic,
    rule: &dyn Rule,
) -> Option<Suppression> {
    if let Some(node) = tree
        .get(diagnostic.anchor)
        .and_then(|_| annotated_suppression(tree, diagnostic.anchor, rule))
    {
        return Some(Suppression::Annotation(node));
    }
    match check_allow_with_reason(tree.source(), diagnostic.location.line, rule) {
        AllowCheck::Allowed { reason } => Some(Suppression::Comment { reason }),
        AllowCheck::Denied => None,
    }
}

/// Warning emitted when a comment allows a rule that demands a reason but
/// gives none.
#[must_use]
pub fn missing_reason(rule: &dyn Rule, anchor: NodeId, location: Location) -> Diagnostic {
    Diagnostic::new(
        rule.code(),
        rule.name(),
        Severity::Warning,
        anchor,
        location,
        format!(
            "Allow directive for '{}' is missing required reason",
            rule.name()
        ),
    )
    .with_help("Add reason=\"...\" to explain why this exception is necessary")
}

fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with("/*")
}

/// Parses an allowance directive from a comment line.
fn parse_allow_directive(line: &str) -> Option<AllowDirective> {
    // Directives may trail code on the same line.
    let start = line.find("//").or_else(|| line.find("/*"))?;
    let comment_content = line[start + 2..].trim().trim_end_matches("*/").trim();

    let directive = comment_content.strip_prefix("sift:")?.trim();
    let allow_content = directive.strip_prefix("allow(")?.trim();

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest.strip_prefix("reason=").and_then(|reason_part| {
        let quoted = reason_part.trim().strip_prefix('"')?;
        let end = quoted.find('"')?;
        Some(quoted[..end].to_string())
    });

    Some(AllowDirective { rules, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Verdict;
    use crate::state::VisitorState;
    use crate::tree::{Kind, TextRange, TreeBuilder};
    use std::path::PathBuf;

    struct Named;

    impl Rule for Named {
        fn name(&self) -> &'static str {
            "return-value-ignored"
        }
        fn code(&self) -> &'static str {
            "SF001"
        }
        fn alt_names(&self) -> &'static [&'static str] {
            &["ResultOfMethodCallIgnored"]
        }
        fn check(&self, _node: NodeId, _state: &VisitorState<'_>) -> Verdict {
            Verdict::NoMatch
        }
    }

    #[test]
    fn test_parse_allow_directive() {
        let directive =
            parse_allow_directive("// sift: allow(return-value-ignored)").expect("directive");
        assert!(directive.rules.contains("return-value-ignored"));
        assert!(directive.reason.is_none());
    }

    #[test]
    fn test_parse_allow_directive_with_reason() {
        let directive =
            parse_allow_directive("  /* sift: allow(SF001, other) reason=\"block form\" */")
                .expect("directive");
        assert!(directive.rules.contains("SF001"));
        assert!(directive.rules.contains("other"));
        assert_eq!(directive.reason.as_deref(), Some("block form"));
    }

    #[test]
    fn test_parse_rejects_other_tools() {
        assert!(parse_allow_directive("// lint: allow(SF001)").is_none());
        assert!(parse_allow_directive("// sift: allow()").is_none());
        assert!(parse_allow_directive("s.trim();").is_none());
    }

    #[test]
    fn test_check_allow_matches_any_identity() {
        let content = "class A {\n  // sift: allow(ResultOfMethodCallIgnored)\n  s.trim();\n}";
        assert!(check_allow_with_reason(content, 3, &Named).is_allowed());
        assert!(check_allow_with_reason(content, 2, &Named).is_allowed());
        assert!(!check_allow_with_reason(content, 4, &Named).is_allowed());

        let same_line = "s.trim(); // sift: allow(all) reason=\"legacy\"";
        assert_eq!(
            check_allow_with_reason(same_line, 1, &Named).reason(),
            Some("legacy")
        );
        let own_line = "// sift: allow(all) reason=\"legacy\"\ns.trim();";
        assert_eq!(
            check_allow_with_reason(own_line, 2, &Named).reason(),
            Some("legacy")
        );
    }

    #[test]
    fn test_trailing_directive_does_not_reach_next_line() {
        let content = "n.add(n); // sift: allow(SF001) reason=\"ok\"\ns.trim();";
        assert!(check_allow_with_reason(content, 1, &Named).is_allowed());
        assert!(!check_allow_with_reason(content, 2, &Named).is_allowed());

        let indented = "  /* sift: allow(SF001) reason=\"ok\" */\n  s.trim();";
        assert!(check_allow_with_reason(indented, 2, &Named).is_allowed());
    }

    #[test]
    fn test_annotations_cover_descendants() {
        let mut b = TreeBuilder::new("A.java", "{s.trim();}");
        let block = b.push(Kind::Block, TextRange::new(0, 11), None);
        let stmt = b.push(Kind::ExpressionStatement, TextRange::new(1, 10), None);
        let call = b.push(Kind::MethodInvocation, TextRange::new(1, 9), None);
        b.attach(block, stmt);
        b.attach(stmt, call);
        b.suppress(block, "SF001");
        let tree = b.finish(block).expect("valid tree");

        assert_eq!(annotated_suppression(&tree, call, &Named), Some(block));

        let diagnostic = Diagnostic::new(
            "SF001",
            "return-value-ignored",
            Severity::Error,
            call,
            Location::from_range(&tree, tree.range(call)),
            "ignored",
        );
        assert_eq!(
            find_suppression(&tree, &diagnostic, &Named),
            Some(Suppression::Annotation(block))
        );
    }

    #[test]
    fn test_missing_reason_is_a_warning() {
        let d = missing_reason(
            &Named,
            NodeId::from_index(0),
            Location::new(PathBuf::from("A.java"), 1, 1),
        );
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(
            d.message,
            "Allow directive for 'return-value-ignored' is missing required reason"
        );
    }
}
