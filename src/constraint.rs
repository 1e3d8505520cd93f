//! Known-plaintext constraints.
//!
//! A constraint pins one text position to a required plaintext letter.
//! Provenance distinguishes anchors, tail blocks, and hypothesized
//! fragments for diagnostics only — it never changes the arithmetic.
//!
//! Malformed constraints are the one fatal input class: they indicate
//! caller error, not an interesting negative result, and are rejected
//! before any wheel work begins.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::alphabet::Letter;
use crate::error::ConstraintError;

/// Where a constraint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// A position range with known plaintext, treated as ground truth.
    Anchor,

    /// A known or assumed trailing block.
    Tail,

    /// A hypothesized fragment under test.
    Hypothesis,
}

/// One required plaintext letter at one text position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Absolute position in the original (un-routed) text.
    pub index: usize,

    /// The plaintext letter required there.
    pub plaintext: Letter,

    /// Diagnostic tag; does not affect forcing arithmetic.
    pub provenance: Provenance,
}

impl Constraint {
    /// Creates a constraint.
    #[must_use]
    pub const fn new(index: usize, plaintext: Letter, provenance: Provenance) -> Self {
        Self {
            index,
            plaintext,
            provenance,
        }
    }

    /// Checks the constraint against a text length.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintError::IndexOutOfBounds` when the index does
    /// not address the text.
    pub fn validate(&self, text_len: usize) -> Result<(), ConstraintError> {
        if self.index >= text_len {
            return Err(ConstraintError::IndexOutOfBounds {
                index: self.index,
                len: text_len,
            });
        }
        Ok(())
    }
}

/// Builds one constraint per letter of `plaintext`, starting at `start`.
///
/// # Errors
///
/// Returns `ConstraintError::NotALetter` for non-alphabetic characters.
pub fn span(
    start: usize,
    plaintext: &str,
    provenance: Provenance,
) -> Result<Vec<Constraint>, ConstraintError> {
    plaintext
        .chars()
        .enumerate()
        .map(|(offset, ch)| Ok(Constraint::new(start + offset, Letter::from_char(ch)?, provenance)))
        .collect()
}

/// Convenience wrapper for an anchor span.
///
/// # Errors
///
/// Returns `ConstraintError::NotALetter` for non-alphabetic characters.
pub fn anchor(start: usize, plaintext: &str) -> Result<Vec<Constraint>, ConstraintError> {
    span(start, plaintext, Provenance::Anchor)
}

/// Convenience wrapper for a tail span.
///
/// # Errors
///
/// Returns `ConstraintError::NotALetter` for non-alphabetic characters.
pub fn tail(start: usize, plaintext: &str) -> Result<Vec<Constraint>, ConstraintError> {
    span(start, plaintext, Provenance::Tail)
}

/// Validates a whole constraint set against a text length.
///
/// Called before any forcing so that bad input aborts the search instead
/// of surfacing as a fake negative result.
///
/// # Errors
///
/// Returns the first `ConstraintError::IndexOutOfBounds` found.
pub fn validate_all(constraints: &[Constraint], text_len: usize) -> Result<(), ConstraintError> {
    for constraint in constraints {
        constraint.validate(text_len)?;
    }
    Ok(())
}

/// Positions held by constraints with the given provenance.
///
/// Used to build the protected set for "NA-only" route admission, where
/// anchor positions must stay outside the permutation domain.
#[must_use]
pub fn positions_with(constraints: &[Constraint], provenance: Provenance) -> BTreeSet<usize> {
    constraints
        .iter()
        .filter(|c| c.provenance == provenance)
        .map(|c| c.index)
        .collect()
}
