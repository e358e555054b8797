//! Rule to flag discarded results of side-effect-free calls.
//!
//! # Rationale
//!
//! Methods of immutable value types such as `String` or `BigInteger` never
//! modify their receiver; they return a new value. Calling one as a
//! statement throws that value away, which almost always means the author
//! expected the call to work in place:
//!
//! ```java
//! s.trim();          // s is unchanged
//! total.add(fee);    // total is unchanged
//! ```
//!
//! # Fix
//!
//! When the call chain starts at a local variable or field whose type can
//! hold the result, the fix assigns the result back (`s = s.trim();`).
//! Otherwise the whole statement is deleted, which is only sound because
//! every matched call belongs to one of the configured side-effect-free
//! types.
//!
//! The deletion removes exactly the statement. When that statement is the
//! unbraced body of an `if` or `else`, the result is a dangling
//! `if (c) ` that no longer compiles; such fixes need a manual touch-up.
//!
//! # Configuration
//!
//! - `types`: fully qualified receiver types to check (default: `String`,
//!   `BigInteger`, `BigDecimal`)
//! - `self_keyword`: self-reference keyword never used as an assignment
//!   target (default: `this`)
//!
//! # Suppression
//!
//! - `suppress: ["return-value-ignored"]` on an enclosing node
//! - `// sift: allow(return-value-ignored) reason="..."` comment

use sift_core::matchers::{
    all_of, kind_is, method_select, parent_node, receiver_has_type, returns_same_type_as_receiver,
    AllOf, Matcher, MatcherExt,
};
use sift_core::{
    AstNode, Category, Description, InvariantViolation, Invocation, Kind, Maturity, NodeId,
    Rule, RuleConfig, Select, Severity, SuggestedFix, SymbolKind, SyntaxTree, Verdict,
    VisitorState,
};

/// Rule code for return-value-ignored.
pub const CODE: &str = "SF001";

/// Rule name for return-value-ignored.
pub const NAME: &str = "return-value-ignored";

/// Receiver types checked unless configured otherwise.
pub const DEFAULT_TYPES: &[&str] = &[
    "java.lang.String",
    "java.math.BigInteger",
    "java.math.BigDecimal",
];

/// Self-reference keyword unless configured otherwise.
pub const DEFAULT_SELF_KEYWORD: &str = "this";

const MESSAGE: &str = "Ignored return value of method that has no side-effect";

/// Flags statement calls on immutable value types whose same-typed result
/// is discarded.
pub struct ReturnValueIgnored {
    types: Vec<String>,
    self_keyword: String,
    severity: Severity,
    matcher: AllOf<Invocation>,
}

impl Default for ReturnValueIgnored {
    fn default() -> Self {
        Self::new()
    }
}

impl ReturnValueIgnored {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(
            DEFAULT_TYPES.iter().map(|t| (*t).to_string()).collect(),
            DEFAULT_SELF_KEYWORD.to_string(),
            Severity::Error,
        )
    }

    /// Creates a rule from its `[rules.return-value-ignored]` section.
    #[must_use]
    pub fn from_config(config: &RuleConfig) -> Self {
        Self::new().configure(config)
    }

    /// Applies the options present in a rule section, keeping the rest.
    #[must_use]
    pub fn configure(self, config: &RuleConfig) -> Self {
        let keyword = config.get_str("self_keyword", &self.self_keyword).to_string();
        let rule = match config.get_str_array("types") {
            Some(types) => self.with_types(types),
            None => self,
        };
        rule.with_self_keyword(keyword)
    }

    /// Replaces the set of checked receiver types.
    #[must_use]
    pub fn with_types<I, S>(self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_parts(
            types.into_iter().map(Into::into).collect(),
            self.self_keyword,
            self.severity,
        )
    }

    /// Sets the self-reference keyword.
    #[must_use]
    pub fn with_self_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.self_keyword = keyword.into();
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Receiver types this rule checks.
    #[must_use]
    pub fn types(&self) -> &[String] {
        &self.types
    }

    fn with_parts(types: Vec<String>, self_keyword: String, severity: Severity) -> Self {
        let matcher = all_of::<Invocation>(vec![
            parent_node(kind_is(Kind::ExpressionStatement)).boxed(),
            method_select(all_of::<NodeId>(vec![
                receiver_has_type(types.iter().cloned()).boxed(),
                returns_same_type_as_receiver().boxed(),
            ]))
            .boxed(),
        ]);
        Self {
            types,
            self_keyword,
            severity,
            matcher,
        }
    }

    fn describe(
        &self,
        call: Invocation,
        state: &VisitorState<'_>,
    ) -> Result<Description, InvariantViolation> {
        let tree = state.tree();
        let types = state.types();
        let callee = call
            .method_select(tree)
            .ok_or_else(|| InvariantViolation::new(call.id(), "invocation has no callee"))?;
        let statement = state
            .parent_of(call.id())
            .ok_or_else(|| InvariantViolation::new(call.id(), "statement call has no parent"))?;

        let target = self.assignment_root(callee, state)?.filter(|&root| {
            match (types.type_of(root), types.return_type(callee)) {
                (Some(root_ty), Some(returned)) => types.is_assignable(returned, root_ty),
                _ => false,
            }
        });

        let description = Description::new(call.id(), MESSAGE);
        Ok(match target {
            Some(root) => {
                let root_text = state.source_for(root);
                description
                    .with_help(format!("Assign the result back to `{root_text}`"))
                    .with_fix(
                        SuggestedFix::new().prefix_with(tree.range(call.id()), format!("{root_text} = ")),
                    )
            }
            None => description
                .with_help("Remove the statement; the call has no effect")
                .with_fix(SuggestedFix::new().delete(tree.range(statement))),
        })
    }

    /// Walks the callee chain outward to the reference the call ultimately
    /// operates on.
    ///
    /// ```text
    /// s.trim()                => s
    /// this.name.trim()        => this.name
    /// s.trim().concat(t)      => s
    /// "x".trim(), (s).trim()  => none
    /// current().name.trim()   => none (the qualifier would run twice)
    /// trim()                  => none (implicit receiver)
    /// ```
    ///
    /// Only locals and fields other than the self keyword qualify, and only
    /// when reached through names alone.
    fn assignment_root(
        &self,
        callee: NodeId,
        state: &VisitorState<'_>,
    ) -> Result<Option<NodeId>, InvariantViolation> {
        let tree = state.tree();
        let mut current = callee;
        loop {
            let receiver = match tree.kind(current) {
                Kind::Identifier => return Ok(None),
                Kind::MemberSelect => Select::cast(tree, current)
                    .and_then(|select| select.receiver(tree))
                    .ok_or_else(|| InvariantViolation::new(current, "member select has no receiver"))?,
                other => {
                    return Err(InvariantViolation::new(
                        current,
                        format!("callee is a {other}, expected identifier or member_select"),
                    ))
                }
            };

            match tree.kind(receiver) {
                Kind::Identifier | Kind::MemberSelect => {
                    let usable = is_plain_reference(tree, receiver)
                        && self.is_assignable_reference(receiver, state);
                    return Ok(usable.then_some(receiver));
                }
                Kind::MethodInvocation => {
                    current = Invocation::cast(tree, receiver)
                        .and_then(|inner| inner.method_select(tree))
                        .ok_or_else(|| InvariantViolation::new(receiver, "invocation has no callee"))?;
                }
                _ => return Ok(None),
            }
        }
    }

    fn is_assignable_reference(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        let bound_to_variable = state
            .types()
            .binding(node)
            .is_some_and(|b| matches!(b.kind, SymbolKind::Local | SymbolKind::Field));
        bound_to_variable && state.source_for(node) != self.self_keyword
    }
}

/// Returns true if `node` is a name or a select chain ending in a name.
fn is_plain_reference(tree: &SyntaxTree, node: NodeId) -> bool {
    let mut current = node;
    loop {
        match tree.kind(current) {
            Kind::Identifier => return true,
            Kind::MemberSelect => {
                match Select::cast(tree, current).and_then(|select| select.receiver(tree)) {
                    Some(receiver) => current = receiver,
                    None => return false,
                }
            }
            _ => return false,
        }
    }
}

impl std::fmt::Debug for ReturnValueIgnored {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReturnValueIgnored")
            .field("types", &self.types)
            .field("self_keyword", &self.self_keyword)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

impl Rule for ReturnValueIgnored {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn alt_names(&self) -> &'static [&'static str] {
        &["ResultOfMethodCallIgnored", "ReturnValueIgnored"]
    }

    fn description(&self) -> &'static str {
        MESSAGE
    }

    fn explanation(&self) -> &'static str {
        "Certain methods have no side effect, so calls to those methods are pointless if you ignore the value returned."
    }

    fn category(&self) -> Category {
        Category::Jdk
    }

    fn maturity(&self) -> Maturity {
        Maturity::Mature
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, node: NodeId, state: &VisitorState<'_>) -> Verdict {
        let Some(call) = Invocation::cast(state.tree(), node) else {
            return Verdict::NoMatch;
        };
        if !self.matcher.matches(call, state) {
            return Verdict::NoMatch;
        }
        match self.describe(call, state) {
            Ok(description) => Verdict::Match(description),
            Err(violation) => Verdict::Violation(violation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::testing::{Fixture, FixtureUnit};
    use sift_core::{
        Binding, Config, Diagnostic, Edit, FailureReason, RuleRegistry, TextRange, TreeBuilder,
        TypeTable,
    };

    fn fixture() -> Fixture {
        Fixture::java()
            .local("s", "java.lang.String")
            .local("t", "java.lang.String")
            .local("n", "java.math.BigInteger")
            .local("d", "java.math.BigDecimal")
            .local("cs", "java.lang.CharSequence")
            .local("sb", "java.lang.StringBuilder")
            .field("name", "java.lang.String")
    }

    fn diagnostics_with(rule: ReturnValueIgnored, unit: &FixtureUnit) -> Vec<Diagnostic> {
        let report = unit.scan(&RuleRegistry::new(vec![Box::new(rule)]));
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        report.diagnostics
    }

    fn diagnostics(source: &str) -> (FixtureUnit, Vec<Diagnostic>) {
        let unit = fixture().parse(source);
        let found = diagnostics_with(ReturnValueIgnored::new(), &unit);
        (unit, found)
    }

    /// Applies the single expected diagnostic's fix to `source`.
    fn fixed(source: &str) -> String {
        let (_, found) = diagnostics(source);
        assert_eq!(found.len(), 1, "expected one diagnostic for {source:?}");
        found[0].fix.apply(source).expect("fix applies")
    }

    // ── Matching ──

    #[test]
    fn test_flags_discarded_trim() {
        let (unit, found) = diagnostics("s.trim();");
        assert_eq!(found.len(), 1);
        let d = &found[0];
        assert_eq!(d.rule, NAME);
        assert_eq!(d.code, CODE);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, MESSAGE);
        assert_eq!(unit.tree.text(d.anchor), "s.trim()");
        assert_eq!(
            d.fix.edits(),
            [Edit::InsertBefore {
                range: TextRange::new(0, 8),
                text: "s = ".to_string(),
            }]
        );
    }

    #[test]
    fn test_flags_big_number_arithmetic() {
        assert_eq!(fixed("n.add(n);"), "n = n.add(n);");
        assert_eq!(fixed("d.setScale(2);"), "d = d.setScale(2);");
    }

    #[test]
    fn test_ignores_used_results() {
        for source in [
            "s = s.trim();",
            "String u = s.trim();",
            "return s.trim();",
            "if (s.trim().isEmpty()) { }",
        ] {
            let (_, found) = diagnostics(source);
            assert!(found.is_empty(), "{source}");
        }
    }

    #[test]
    fn test_arguments_are_used_values() {
        let (unit, found) = diagnostics("t.concat(s.trim());");
        assert_eq!(found.len(), 1);
        assert_eq!(unit.tree.text(found[0].anchor), "t.concat(s.trim())");
    }

    #[test]
    fn test_outer_call_with_different_return_type_is_not_flagged() {
        let (_, found) = diagnostics("s.trim().length();");
        assert!(found.is_empty());
    }

    #[test]
    fn test_ignores_types_outside_the_set() {
        let (_, found) = diagnostics("sb.reverse(); s.toString(); s.isEmpty();");
        assert!(found.is_empty());
    }

    #[test]
    fn test_unresolved_receivers_do_not_match() {
        let (_, found) = diagnostics("mystery.trim(); mystery.foo();");
        assert!(found.is_empty());
    }

    #[test]
    fn test_custom_type_set() {
        let unit = fixture()
            .local("m", "com.acme.Money")
            .method("com.acme.Money", "plus", "com.acme.Money")
            .parse("m.plus(m); s.trim();");
        let rule = ReturnValueIgnored::new().with_types(["com.acme.Money"]);
        let found = diagnostics_with(rule, &unit);
        assert_eq!(found.len(), 1);
        assert_eq!(unit.tree.text(found[0].anchor), "m.plus(m)");
    }

    // ── Assign-back fix ──

    #[test]
    fn test_assigns_back_to_root_of_chain() {
        assert_eq!(
            fixed("s.trim().toLowerCase();"),
            "s = s.trim().toLowerCase();"
        );
    }

    #[test]
    fn test_assigns_back_to_fields() {
        assert_eq!(fixed("name.trim();"), "name = name.trim();");
        assert_eq!(fixed("this.name.trim();"), "this.name = this.name.trim();");
    }

    #[test]
    fn test_assigns_to_wider_root_type() {
        assert_eq!(
            fixed("cs.toString().trim();"),
            "cs = cs.toString().trim();"
        );
    }

    #[test]
    fn test_fix_is_idempotent() {
        let once = fixed("s.trim();");
        let (_, again) = diagnostics(&once);
        assert!(again.is_empty());
    }

    #[test]
    fn test_fixes_nested_statements_in_place() {
        let source = "if (s.isEmpty()) {\n  s.trim();\n}";
        assert_eq!(fixed(source), "if (s.isEmpty()) {\n  s = s.trim();\n}");
    }

    // ── Delete fallback ──

    #[test]
    fn test_deletes_literal_receiver_statement() {
        assert_eq!(fixed("\"literal\".trim();"), "");
    }

    #[test]
    fn test_delete_leaves_neighbours_untouched() {
        let source = "s.length();\n\"literal\".trim();\ns.isEmpty();";
        assert_eq!(fixed(source), "s.length();\n\ns.isEmpty();");
    }

    #[test]
    fn test_deletes_when_root_cannot_hold_result() {
        assert_eq!(fixed("sb.toString().trim();"), "");
    }

    #[test]
    fn test_delete_in_unbraced_branch_removes_only_the_statement() {
        assert_eq!(
            fixed("if (s.isEmpty()) \"x\".trim();"),
            "if (s.isEmpty()) "
        );
    }

    #[test]
    fn test_deletes_anonymous_receivers() {
        assert_eq!(fixed("(s).trim();"), "");
        assert_eq!(fixed("new BigInteger(\"1\").negate();"), "");
        assert_eq!(fixed("BigInteger.valueOf(1).add(n);"), "");
    }

    #[test]
    fn test_deletes_when_qualifier_contains_a_call() {
        let unit = fixture()
            .method("com.example.Main", "current", "com.example.Main")
            .parse("current().name.trim();");
        let found = diagnostics_with(ReturnValueIgnored::new(), &unit);
        assert_eq!(found.len(), 1);
        assert!(matches!(found[0].fix.edits(), [Edit::Delete { .. }]));
        assert_eq!(found[0].fix.apply(unit.tree.source()).expect("applies"), "");
    }

    #[test]
    fn test_deletes_calls_on_self() {
        let unit = fixture()
            .this_type("java.lang.String")
            .parse("this.trim(); trim();");
        let found = diagnostics_with(ReturnValueIgnored::new(), &unit);
        assert_eq!(found.len(), 2);
        for d in &found {
            assert!(matches!(d.fix.edits(), [Edit::Delete { .. }]));
        }
    }

    #[test]
    fn test_self_keyword_is_configurable() {
        let unit = fixture().local("self", "java.lang.String").parse("self.trim();");

        let default = diagnostics_with(ReturnValueIgnored::new(), &unit);
        assert_eq!(
            default[0].fix.apply(unit.tree.source()).expect("applies"),
            "self = self.trim();"
        );

        let custom = diagnostics_with(ReturnValueIgnored::new().with_self_keyword("self"), &unit);
        assert_eq!(custom[0].fix.apply(unit.tree.source()).expect("applies"), "");
    }

    // ── Invariants ──

    #[test]
    fn test_malformed_callee_is_an_internal_failure() {
        // Statement wrapping a call whose callee is a literal bound as a method.
        let source = "\"x\"();";
        let mut b = TreeBuilder::new("A.java", source);
        let root = b.push(Kind::CompilationUnit, TextRange::new(0, 6), None);
        let stmt = b.push(Kind::ExpressionStatement, TextRange::new(0, 6), None);
        let call = b.push(Kind::MethodInvocation, TextRange::new(0, 5), None);
        let callee = b.push(Kind::Literal, TextRange::new(0, 3), None);
        b.attach(root, stmt);
        b.attach(stmt, call);
        b.attach(call, callee);
        let tree = b.finish(root).expect("valid tree");

        let mut types = TypeTable::new();
        let string = types.intern("java.lang.String");
        types.bind(
            callee,
            Binding {
                kind: SymbolKind::Method,
                ty: None,
                owner: Some(string),
                returns: Some(string),
            },
        );

        let registry = RuleRegistry::new(vec![Box::new(ReturnValueIgnored::new())]);
        let report = sift_core::scan(&tree, &types, &registry);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].node, call);
        assert!(matches!(
            &report.failures[0].reason,
            FailureReason::Invariant(detail) if detail.contains("literal")
        ));
    }

    // ── Metadata and configuration ──

    #[test]
    fn test_metadata() {
        let rule = ReturnValueIgnored::new();
        assert!(rule.answers_to("return-value-ignored"));
        assert!(rule.answers_to("SF001"));
        assert!(rule.answers_to("ResultOfMethodCallIgnored"));
        assert!(rule.answers_to("ReturnValueIgnored"));
        assert_eq!(rule.category(), Category::Jdk);
        assert_eq!(rule.maturity(), Maturity::Mature);
        assert!(rule.requires_allow_reason());
        assert!(!rule.explanation().is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = Config::parse(
            r#"
[rules.return-value-ignored]
types = ["com.acme.Money"]
self_keyword = "self"
"#,
        )
        .expect("valid config");
        let rule = ReturnValueIgnored::from_config(config.rule(NAME).expect("section"));
        assert_eq!(rule.types(), ["com.acme.Money"]);
        assert_eq!(rule.self_keyword, "self");

        let defaults = ReturnValueIgnored::from_config(&RuleConfig::default());
        assert_eq!(defaults.types(), DEFAULT_TYPES);
    }
}
