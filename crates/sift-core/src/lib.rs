//! # sift-core
//!
//! Engine for tree-pattern static analysis with suggested fixes.
//!
//! A front end hands over one compilation unit at a time as a syntax tree
//! with type bindings. This crate provides:
//!
//! - [`SyntaxTree`] and [`TypeResolver`], the read-only model rules query
//! - [`matchers`], composable predicates over nodes
//! - [`Rule`] and [`RuleRegistry`] for node-level checks
//! - [`scan`], the pre-order traversal that isolates rule failures
//! - [`SuggestedFix`] and [`EditBuffer`] for proposed source edits
//! - [`Analyzer`] for discovering unit documents and running rules over them
//!
//! ## Example
//!
//! ```ignore
//! use sift_core::{Analyzer, Severity};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./units")
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! println!("{}", result.summary());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod diagnostic;
mod fix;
mod resolve;
mod rule;
mod scanner;
mod state;
mod suppression;
mod tree;
mod unit;

/// Composable node predicates.
pub mod matchers;

/// Fixture builder for tests of rules built on this crate.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError, UnitReport};
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig, DEFAULT_INCLUDE};
pub use diagnostic::{
    Diagnostic, DiagnosticReport, FailureReason, LintResult, Location, RuleFailure, Severity,
};
pub use fix::{Edit, EditBuffer, Fix, FixError, SuggestedFix};
pub use resolve::{Binding, SymbolKind, TypeId, TypeResolver, TypeTable};
pub use rule::{
    Category, Description, InvariantViolation, Maturity, Rule, RuleBox, RuleRegistry, Verdict,
};
pub use scanner::{scan, ScanReport};
pub use state::VisitorState;
pub use suppression::{check_allow_with_reason, AllowCheck, Suppression};
pub use tree::{AstNode, Invocation, Kind, Node, NodeId, Select, SyntaxTree, TextRange, TreeBuilder};
pub use unit::{Unit, UnitError};
