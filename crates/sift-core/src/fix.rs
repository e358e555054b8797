//! Textual edits proposed by rules and their application.
//!
//! All ranges refer to the original, unmodified source. A rule collects edits
//! into a [`SuggestedFix`]; sealing it into a [`Fix`] sorts the edits and
//! rejects overlaps. Consumers apply a fix on its own with [`Fix::apply`], or
//! merge the fixes of many diagnostics through an [`EditBuffer`].

use crate::tree::TextRange;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while sealing or applying edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    /// Two edits touch the same text.
    #[error("edits overlap: {first} and {second}")]
    Overlap {
        /// Range of the earlier edit.
        first: TextRange,
        /// Range of the conflicting edit.
        second: TextRange,
    },

    /// An edit points outside the source or into a multi-byte character.
    #[error("edit range {range} is invalid for a source of {source_len} bytes")]
    OutOfBounds {
        /// Offending range.
        range: TextRange,
        /// Length of the source the edit was applied to.
        source_len: usize,
    },
}

/// One textual change to the original source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    /// Inserts `text` immediately before `range.start`.
    InsertBefore {
        /// Range whose start is the insertion point.
        range: TextRange,
        /// Text to insert.
        text: String,
    },
    /// Removes the text in `range`.
    Delete {
        /// Range to remove.
        range: TextRange,
    },
    /// Replaces the text in `range` with `text`.
    Replace {
        /// Range to replace.
        range: TextRange,
        /// Replacement text.
        text: String,
    },
}

impl Edit {
    /// Source span the edit consumes; empty for insertions.
    #[must_use]
    pub fn span(&self) -> TextRange {
        match self {
            Self::InsertBefore { range, .. } => TextRange::empty(range.start),
            Self::Delete { range } | Self::Replace { range, .. } => *range,
        }
    }

    /// Text the edit puts in place of its span.
    #[must_use]
    pub fn replacement(&self) -> &str {
        match self {
            Self::InsertBefore { text, .. } | Self::Replace { text, .. } => text,
            Self::Delete { .. } => "",
        }
    }

    /// Returns true if applying both edits would be ambiguous.
    ///
    /// Two insertions conflict at the same point; an insertion conflicts with
    /// a removal strictly containing its point; two removals conflict when
    /// they share any byte.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        let (a, b) = (self.span(), other.span());
        match (a.is_empty(), b.is_empty()) {
            (true, true) => a.start == b.start,
            (true, false) => b.start < a.start && a.start < b.end,
            (false, true) => a.start < b.start && b.start < a.end,
            (false, false) => a.start < b.end && b.start < a.end,
        }
    }
}

/// Edits collected by a rule before they are validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestedFix {
    edits: Vec<Edit>,
}

impl SuggestedFix {
    /// Creates an empty fix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `text` before the start of `range`.
    #[must_use]
    pub fn prefix_with(mut self, range: TextRange, text: impl Into<String>) -> Self {
        self.edits.push(Edit::InsertBefore {
            range,
            text: text.into(),
        });
        self
    }

    /// Inserts `text` after the end of `range`.
    #[must_use]
    pub fn postfix_with(mut self, range: TextRange, text: impl Into<String>) -> Self {
        self.edits.push(Edit::InsertBefore {
            range: TextRange::empty(range.end),
            text: text.into(),
        });
        self
    }

    /// Removes `range`.
    #[must_use]
    pub fn delete(mut self, range: TextRange) -> Self {
        self.edits.push(Edit::Delete { range });
        self
    }

    /// Replaces `range` with `text`.
    #[must_use]
    pub fn replace(mut self, range: TextRange, text: impl Into<String>) -> Self {
        self.edits.push(Edit::Replace {
            range,
            text: text.into(),
        });
        self
    }

    /// Returns true if no edits were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edits in the order they were added.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Sorts the edits by position and checks that none overlap.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::Overlap`] for the first conflicting pair.
    pub fn seal(mut self) -> Result<Fix, FixError> {
        self.edits.sort_by_key(|edit| (edit.span().start, edit.span().end));
        for pair in self.edits.windows(2) {
            if pair[0].conflicts_with(&pair[1]) {
                return Err(FixError::Overlap {
                    first: pair[0].span(),
                    second: pair[1].span(),
                });
            }
        }
        Ok(Fix { edits: self.edits })
    }
}

/// Validated, position-ordered, non-overlapping edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fix {
    edits: Vec<Edit>,
}

impl Fix {
    /// Edits in ascending source order.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Returns true if the fix changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Applies the edits to `source`, rightmost first.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::OutOfBounds`] if an edit does not fit `source`.
    pub fn apply(&self, source: &str) -> Result<String, FixError> {
        apply_sorted(source, self.edits.iter())
    }
}

/// Merges the fixes of several diagnostics for one source text.
///
/// A fix is accepted whole or not at all: if any of its edits conflicts with
/// an edit already accepted, [`EditBuffer::try_add`] leaves the buffer
/// untouched and returns false.
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    edits: Vec<Edit>,
}

impl EditBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every edit of `fix` unless one of them conflicts.
    pub fn try_add(&mut self, fix: &Fix) -> bool {
        let conflict = fix
            .edits()
            .iter()
            .any(|new| self.edits.iter().any(|old| old.conflicts_with(new)));
        if conflict {
            return false;
        }
        self.edits.extend(fix.edits().iter().cloned());
        true
    }

    /// Number of accepted edits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Returns true if nothing was accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Applies all accepted edits to `source`.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::OutOfBounds`] if an edit does not fit `source`.
    pub fn apply(mut self, source: &str) -> Result<String, FixError> {
        self.edits
            .sort_by_key(|edit| (edit.span().start, edit.span().end));
        apply_sorted(source, self.edits.iter())
    }
}

fn apply_sorted<'e>(
    source: &str,
    edits: impl DoubleEndedIterator<Item = &'e Edit>,
) -> Result<String, FixError> {
    let mut out = source.to_string();
    for edit in edits.rev() {
        let range = edit.span();
        if range.start > range.end
            || range.end > source.len()
            || !source.is_char_boundary(range.start)
            || !source.is_char_boundary(range.end)
        {
            return Err(FixError::OutOfBounds {
                range,
                source_len: source.len(),
            });
        }
        out.replace_range(range.start..range.end, edit.replacement());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "a(); s.trim(); b();";

    #[test]
    fn prefix_inserts_before_range() {
        let fix = SuggestedFix::new()
            .prefix_with(TextRange::new(5, 13), "s = ")
            .seal()
            .expect("single edit cannot overlap");
        assert_eq!(fix.apply(SRC).as_deref(), Ok("a(); s = s.trim(); b();"));
    }

    #[test]
    fn delete_removes_exactly_the_range() {
        let fix = SuggestedFix::new()
            .delete(TextRange::new(5, 14))
            .seal()
            .expect("single edit cannot overlap");
        assert_eq!(fix.apply(SRC).as_deref(), Ok("a();  b();"));
    }

    #[test]
    fn edits_apply_rightmost_first_with_original_offsets() {
        let fix = SuggestedFix::new()
            .replace(TextRange::new(15, 16), "c")
            .prefix_with(TextRange::new(5, 13), "s = ")
            .postfix_with(TextRange::new(0, 3), "/*x*/")
            .seal()
            .expect("disjoint edits");
        assert_eq!(fix.edits()[0].span(), TextRange::empty(3));
        assert_eq!(fix.apply(SRC).as_deref(), Ok("a()/*x*/; s = s.trim(); c();"));
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let err = SuggestedFix::new()
            .delete(TextRange::new(5, 14))
            .replace(TextRange::new(7, 11), "strip")
            .seal()
            .expect_err("overlap must be rejected");
        assert!(matches!(err, FixError::Overlap { .. }));

        let err = SuggestedFix::new()
            .prefix_with(TextRange::new(5, 6), "x")
            .prefix_with(TextRange::new(5, 9), "y")
            .seal();
        assert!(err.is_err(), "two insertions at one point are ambiguous");

        let ok = SuggestedFix::new()
            .prefix_with(TextRange::new(5, 6), "x")
            .delete(TextRange::new(5, 14))
            .seal();
        assert!(ok.is_ok(), "insertion at the start of a deletion is ordered");
    }

    #[test]
    fn out_of_bounds_is_reported() {
        let fix = SuggestedFix::new()
            .delete(TextRange::new(10, 99))
            .seal()
            .expect("single edit");
        assert!(matches!(
            fix.apply(SRC),
            Err(FixError::OutOfBounds { source_len: 19, .. })
        ));
    }

    #[test]
    fn buffer_rejects_conflicting_fix_whole() {
        let first = SuggestedFix::new()
            .delete(TextRange::new(5, 14))
            .seal()
            .expect("single edit");
        let second = SuggestedFix::new()
            .prefix_with(TextRange::new(0, 3), "x = ")
            .prefix_with(TextRange::new(7, 13), "y")
            .seal()
            .expect("disjoint edits");
        let third = SuggestedFix::new()
            .replace(TextRange::new(15, 16), "c")
            .seal()
            .expect("single edit");

        let mut buffer = EditBuffer::new();
        assert!(buffer.try_add(&first));
        assert!(!buffer.try_add(&second));
        assert!(buffer.try_add(&third));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.apply(SRC).as_deref(), Ok("a();  c();"));
    }

    #[test]
    fn edits_serialize_with_op_tag() {
        let fix = SuggestedFix::new()
            .prefix_with(TextRange::new(5, 13), "s = ")
            .seal()
            .expect("single edit");
        let json = serde_json::to_string(&fix).expect("serializable");
        assert_eq!(
            json,
            r#"[{"op":"insert_before","range":{"start":5,"end":13},"text":"s = "}]"#
        );
    }
}
