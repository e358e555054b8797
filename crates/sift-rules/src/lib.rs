//! # sift-rules
//!
//! Built-in lint rules for sift.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | SF001 | `return-value-ignored` | Flags discarded results of side-effect-free calls on immutable value types |
//!
//! ## Usage
//!
//! ```ignore
//! use sift_core::Analyzer;
//! use sift_rules::ReturnValueIgnored;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./units")
//!     .rule(ReturnValueIgnored::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod presets;
pub mod return_value_ignored;

pub use presets::{all_rules, minimal_rules, recommended_rules, strict_rules, Preset};
pub use return_value_ignored::ReturnValueIgnored;

/// Re-export core types for convenience.
pub use sift_core::{Diagnostic, Rule, Severity};
