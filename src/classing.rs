//! Equivalence-class schemes for key-schedule position mapping.
//!
//! A classing scheme partitions text positions into classes, each served
//! by its own key wheel. `class_of` is pure, total, and deterministic:
//! any position yields a defined class, with no failure mode.
//!
//! Which formula is "right" for a given cipher is an open question the
//! solver does not answer; the scheme is a pluggable search parameter.

use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// How text positions map to key-wheel classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum ClassingScheme {
    /// A single class: every position feeds one wheel.
    Identity,

    /// Six classes from position parity and triality:
    /// `class = (i mod 2) * 3 + (i mod 3)`.
    ParityTriality,

    /// Grid rows: `class = i / width`.
    GridRows {
        /// Width of the grid. Non-zero by construction, even via serde.
        width: NonZeroUsize,
    },

    /// Grid columns: `class = i mod width`.
    GridColumns {
        /// Width of the grid. Non-zero by construction, even via serde.
        width: NonZeroUsize,
    },
}

impl ClassingScheme {
    /// Maps an absolute position to its class id.
    #[must_use]
    pub fn class_of(self, index: usize) -> usize {
        match self {
            Self::Identity => 0,
            Self::ParityTriality => (index % 2) * 3 + index % 3,
            Self::GridRows { width } => index / width.get(),
            Self::GridColumns { width } => index % width.get(),
        }
    }

    /// Number of classes reachable for a text of the given length.
    #[must_use]
    pub fn class_count(self, text_len: usize) -> usize {
        match self {
            Self::Identity => 1,
            Self::ParityTriality => 6,
            Self::GridRows { width } => text_len.div_ceil(width.get()).max(1),
            Self::GridColumns { width } => width.get().min(text_len).max(1),
        }
    }
}

impl fmt::Display for ClassingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::ParityTriality => write!(f, "parity_triality"),
            Self::GridRows { width } => write!(f, "grid_rows({width})"),
            Self::GridColumns { width } => write!(f, "grid_columns({width})"),
        }
    }
}
