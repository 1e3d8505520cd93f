//! The 26-letter alphabet and its modular arithmetic.
//!
//! Every symbol the solver touches is a [`Letter`]: a value in `0..26`
//! enforced at construction, at parse time, and through serde. Underived
//! plaintext positions are represented as `Option<Letter>` — `None` is
//! the explicit "unknown" sentinel, never a placeholder letter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConstraintError;

/// Number of symbols in the alphabet.
pub const ALPHABET_LEN: u8 = 26;

/// A single symbol of the 26-letter alphabet.
///
/// Internally a `u8` in `0..26` (`A = 0`, `Z = 25`). The invariant holds
/// for every constructed value, including values arriving through serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Letter(u8);

impl Letter {
    /// Creates a letter from a raw value in `0..26`.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintError::SymbolOutOfRange` for values `>= 26`.
    pub fn new(value: u8) -> Result<Self, ConstraintError> {
        if value < ALPHABET_LEN {
            Ok(Self(value))
        } else {
            Err(ConstraintError::SymbolOutOfRange { value })
        }
    }

    /// Creates a letter from an ASCII character, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintError::NotALetter` for anything outside `A..=Z`
    /// and `a..=z`.
    pub fn from_char(ch: char) -> Result<Self, ConstraintError> {
        if ch.is_ascii_uppercase() {
            Ok(Self(ch as u8 - b'A'))
        } else if ch.is_ascii_lowercase() {
            Ok(Self(ch as u8 - b'a'))
        } else {
            Err(ConstraintError::NotALetter { ch })
        }
    }

    /// Returns the raw value in `0..26`.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Builds a letter from a residue, reducing modulo 26.
    #[inline]
    pub(crate) const fn from_residue(value: u8) -> Self {
        Self(value % ALPHABET_LEN)
    }

    /// Returns the uppercase ASCII character for this letter.
    #[must_use]
    pub const fn to_char(self) -> char {
        (b'A' + self.0) as char
    }

    /// Adds another letter value modulo 26.
    #[must_use]
    #[inline]
    pub const fn add(self, other: Self) -> Self {
        Self(add_mod(self.0, other.0))
    }

    /// Subtracts another letter value modulo 26.
    #[must_use]
    #[inline]
    pub const fn sub(self, other: Self) -> Self {
        Self(sub_mod(self.0, other.0))
    }
}

impl TryFrom<u8> for Letter {
    type Error = ConstraintError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Letter> for u8 {
    fn from(letter: Letter) -> Self {
        letter.0
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Adds two residues modulo 26. Inputs must already be reduced.
#[inline]
#[must_use]
pub const fn add_mod(a: u8, b: u8) -> u8 {
    let s = a + b;
    if s >= ALPHABET_LEN {
        s - ALPHABET_LEN
    } else {
        s
    }
}

/// Subtracts `b` from `a` modulo 26. Inputs must already be reduced.
#[inline]
#[must_use]
pub const fn sub_mod(a: u8, b: u8) -> u8 {
    if a >= b {
        a - b
    } else {
        ALPHABET_LEN - (b - a)
    }
}

/// Parses a string of letters into a symbol sequence.
///
/// # Errors
///
/// Returns `ConstraintError::NotALetter` at the first non-alphabetic
/// character. Whitespace is not tolerated; the caller owns stripping.
pub fn parse_text(text: &str) -> Result<Vec<Letter>, ConstraintError> {
    text.chars().map(Letter::from_char).collect()
}

/// Renders a symbol sequence as an uppercase string.
#[must_use]
pub fn render_text(text: &[Letter]) -> String {
    text.iter().map(|l| l.to_char()).collect()
}

/// Renders a partially derived text, substituting `sentinel` for every
/// unknown position.
#[must_use]
pub fn render_partial(text: &[Option<Letter>], sentinel: char) -> String {
    text.iter()
        .map(|slot| slot.map_or(sentinel, Letter::to_char))
        .collect()
}
