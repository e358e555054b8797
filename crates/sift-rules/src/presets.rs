//! Rule presets for common configurations.

use crate::return_value_ignored::{self, ReturnValueIgnored, DEFAULT_TYPES};
use sift_core::{Config, RuleBox, Severity};

/// Extra immutable value types checked by the strict preset.
const STRICT_EXTRA_TYPES: &[&str] = &[
    "java.time.Duration",
    "java.time.Instant",
    "java.time.LocalDate",
    "java.time.LocalDateTime",
];

/// Preset configurations for sift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Recommended rules with sensible defaults.
    Recommended,
    /// Strict rules covering more types.
    Strict,
    /// Minimal rules for gradual adoption.
    Minimal,
}

impl Preset {
    /// Looks up a preset by its configuration name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "recommended" => Some(Self::Recommended),
            "strict" => Some(Self::Strict),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    /// Resolves the preset named in `config`, falling back to recommended.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        match config.preset.as_deref() {
            None => Self::Recommended,
            Some(name) => Self::parse(name).unwrap_or_else(|| {
                tracing::warn!("Unknown preset '{}', using recommended", name);
                Self::Recommended
            }),
        }
    }

    /// Returns the rules for this preset.
    #[must_use]
    pub fn rules(self) -> Vec<RuleBox> {
        vec![Box::new(self.return_value_ignored())]
    }

    /// Returns the rules for this preset with the options of `config`
    /// applied.
    #[must_use]
    pub fn configured_rules(self, config: &Config) -> Vec<RuleBox> {
        let rule = self.return_value_ignored();
        let rule = match config.rule(return_value_ignored::NAME) {
            Some(section) => rule.configure(section),
            None => rule,
        };
        vec![Box::new(rule)]
    }

    fn return_value_ignored(self) -> ReturnValueIgnored {
        match self {
            Self::Recommended => ReturnValueIgnored::new(),
            Self::Strict => ReturnValueIgnored::new()
                .with_types(DEFAULT_TYPES.iter().chain(STRICT_EXTRA_TYPES).copied()),
            Self::Minimal => ReturnValueIgnored::new().severity(Severity::Warning),
        }
    }
}

/// Returns the recommended set of rules.
///
/// Includes:
/// - `return-value-ignored` (SF001) - `String`, `BigInteger`, `BigDecimal`
#[must_use]
pub fn recommended_rules() -> Vec<RuleBox> {
    Preset::Recommended.rules()
}

/// Returns the strict set of rules.
///
/// Includes all recommended rules plus:
/// - `return-value-ignored` also checking `java.time` value types
#[must_use]
pub fn strict_rules() -> Vec<RuleBox> {
    Preset::Strict.rules()
}

/// Returns the minimal set of rules.
///
/// For gradual adoption, only includes:
/// - `return-value-ignored` reporting warnings instead of errors
#[must_use]
pub fn minimal_rules() -> Vec<RuleBox> {
    Preset::Minimal.rules()
}

/// Returns all available rules.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![Box::new(ReturnValueIgnored::new())]
}
