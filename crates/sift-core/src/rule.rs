//! Rule trait, rule outcomes and the rule registry.

use crate::diagnostic::Severity;
use crate::fix::SuggestedFix;
use crate::state::VisitorState;
use crate::tree::NodeId;
use serde::Serialize;
use thiserror::Error;

/// Library area a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Misuse of the platform standard library.
    Jdk,
    /// Misuse of a third-party library.
    Library,
    /// Project-specific convention.
    OneOff,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jdk => write!(f, "jdk"),
            Self::Library => write!(f, "library"),
            Self::OneOff => write!(f, "one-off"),
        }
    }
}

/// How trustworthy a rule's findings are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Maturity {
    /// Low false-positive rate; safe to fail builds on.
    Mature,
    /// Still being evaluated.
    Experimental,
}

impl std::fmt::Display for Maturity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mature => write!(f, "mature"),
            Self::Experimental => write!(f, "experimental"),
        }
    }
}

/// A rule's finding at one node, before it becomes a [`crate::Diagnostic`].
#[derive(Debug, Clone)]
pub struct Description {
    /// Node the finding is attached to.
    pub anchor: NodeId,
    /// Human-readable message.
    pub message: String,
    /// Short description of the proposed fix.
    pub help: Option<String>,
    /// Proposed edits, not yet validated.
    pub fix: SuggestedFix,
}

impl Description {
    /// Creates a finding with no fix.
    #[must_use]
    pub fn new(anchor: NodeId, message: impl Into<String>) -> Self {
        Self {
            anchor,
            message: message.into(),
            help: None,
            fix: SuggestedFix::new(),
        }
    }

    /// Attaches a help line.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attaches the proposed edits.
    #[must_use]
    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.fix = fix;
        self
    }
}

/// A rule found the tree in a shape its logic assumes cannot happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail} at {node}")]
pub struct InvariantViolation {
    /// Node where the assumption broke.
    pub node: NodeId,
    /// What was expected.
    pub detail: String,
}

impl InvariantViolation {
    /// Creates a violation at `node`.
    #[must_use]
    pub fn new(node: NodeId, detail: impl Into<String>) -> Self {
        Self {
            node,
            detail: detail.into(),
        }
    }
}

/// Outcome of evaluating one rule at one node.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// The node does not exhibit the pattern.
    NoMatch,
    /// The node exhibits the pattern.
    Match(Description),
    /// The rule cannot classify the node.
    Violation(InvariantViolation),
}

impl From<Result<Option<Description>, InvariantViolation>> for Verdict {
    fn from(result: Result<Option<Description>, InvariantViolation>) -> Self {
        match result {
            Ok(Some(description)) => Self::Match(description),
            Ok(None) => Self::NoMatch,
            Err(violation) => Self::Violation(violation),
        }
    }
}

/// A node-level lint rule.
///
/// The scanner calls [`Rule::check`] once for every node of a unit, in
/// document order. Implementations decide cheaply whether the node is of
/// interest (usually with a [`crate::matchers::Matcher`]) and return
/// [`Verdict::NoMatch`] otherwise.
///
/// # Example
///
/// ```ignore
/// use sift_core::{Description, Kind, Rule, Verdict, VisitorState, NodeId};
///
/// pub struct NoEmptyStatement;
///
/// impl Rule for NoEmptyStatement {
///     fn name(&self) -> &'static str { "no-empty-statement" }
///     fn code(&self) -> &'static str { "SF900" }
///
///     fn check(&self, node: NodeId, state: &VisitorState<'_>) -> Verdict {
///         if state.tree().kind(node) == Kind::ExpressionStatement
///             && state.source_for(node) == ";"
///         {
///             Verdict::Match(Description::new(node, "Empty statement"))
///         } else {
///             Verdict::NoMatch
///         }
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "return-value-ignored").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "SF001").
    fn code(&self) -> &'static str;

    /// Other names that select this rule in suppressions and filters.
    fn alt_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Returns a one-line summary of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns a longer explanation of why the pattern is a problem.
    fn explanation(&self) -> &'static str {
        ""
    }

    /// Returns the library area of this rule.
    fn category(&self) -> Category {
        Category::OneOff
    }

    /// Returns the maturity of this rule.
    fn maturity(&self) -> Maturity {
        Maturity::Experimental
    }

    /// Returns the default severity for diagnostics from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Whether this rule requires a reason when using allow directives.
    ///
    /// By default, rules with `Severity::Error` require a reason.
    fn requires_allow_reason(&self) -> bool {
        self.default_severity() == Severity::Error
    }

    /// Returns true if `key` names this rule by name, code or alt name.
    fn answers_to(&self, key: &str) -> bool {
        key == self.name() || key == self.code() || self.alt_names().contains(&key)
    }

    /// Evaluates the rule at `node`.
    fn check(&self, node: NodeId, state: &VisitorState<'_>) -> Verdict;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

/// Ordered, immutable collection of rules for an analysis run.
///
/// Built once at startup and shared by reference with every scan.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<RuleBox>,
}

impl RuleRegistry {
    /// Creates a registry from rules in registration order.
    ///
    /// A later rule with a name already registered is dropped.
    #[must_use]
    pub fn new(rules: Vec<RuleBox>) -> Self {
        let mut kept: Vec<RuleBox> = Vec::with_capacity(rules.len());
        for rule in rules {
            if kept.iter().any(|r| r.name() == rule.name()) {
                tracing::warn!("Duplicate rule ignored: {}", rule.name());
                continue;
            }
            kept.push(rule);
        }
        Self { rules: kept }
    }

    /// Iterates over rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Finds a rule by name, code or alt name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&dyn Rule> {
        self.iter().find(|rule| rule.answers_to(key))
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}

impl FromIterator<RuleBox> for RuleRegistry {
    fn from_iter<I: IntoIterator<Item = RuleBox>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
