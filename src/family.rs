//! Cipher families and tableau tables.
//!
//! Every family is a variant of the closed [`Family`] enum, and the
//! encrypt/decrypt/key-recovery relations are exhaustively matched pure
//! functions. Adding a family is a compiler-checked change.
//!
//! The three additive families relate plaintext `p`, ciphertext `c`, and
//! key residue `k` arithmetically (mod 26):
//!
//! | family           | encrypt     | decrypt     | key recovery |
//! |------------------|-------------|-------------|--------------|
//! | Vigenère         | `c = p + k` | `p = c − k` | `k = c − p`  |
//! | Beaufort         | `c = k − p` | `p = k − c` | `k = p + c`  |
//! | Variant-Beaufort | `c = p − k` | `p = c + k` | `k = p − c`  |
//!
//! Table-keyed families (Porta, the Quagmire shapes) replace the
//! arithmetic with a row lookup in a validated [`Tableau`]; the key
//! residue is the row index.

use serde::{Deserialize, Serialize};

use crate::alphabet::{add_mod, sub_mod, Letter, ALPHABET_LEN};
use crate::error::{ConfigError, ConstraintError};

/// A precomputed table of cipher rows, each a bijection on the alphabet.
///
/// Rows are validated at construction: serde deserialization goes through
/// the same check, so an invalid table cannot be smuggled in from a
/// descriptor file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[u8; 26]>", into = "Vec<[u8; 26]>")]
pub struct Tableau {
    rows: Vec<[u8; 26]>,
}

impl Tableau {
    /// Builds a tableau from explicit rows (the Quagmire II/IV case,
    /// where the table is supplied externally).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyTableau` for zero rows and
    /// `ConfigError::InvalidTableauRow` for any row that is not a
    /// permutation of `0..26`.
    pub fn from_rows(rows: Vec<[u8; 26]>) -> Result<Self, ConfigError> {
        if rows.is_empty() {
            return Err(ConfigError::EmptyTableau);
        }
        for (i, row) in rows.iter().enumerate() {
            let mut seen = [false; 26];
            for &value in row {
                if value >= ALPHABET_LEN || seen[usize::from(value)] {
                    return Err(ConfigError::InvalidTableauRow { row: i });
                }
                seen[usize::from(value)] = true;
            }
        }
        Ok(Self { rows })
    }

    /// Builds the 13-row reciprocal Porta table.
    ///
    /// Each row is self-inverse: encrypting twice with the same row is
    /// the identity.
    #[must_use]
    pub fn porta() -> Self {
        let mut rows = Vec::with_capacity(13);
        for r in 0u8..13 {
            let mut row = [0u8; 26];
            for p in 0u8..13 {
                row[usize::from(p)] = 13 + (p + r) % 13;
            }
            for p in 13u8..26 {
                row[usize::from(p)] = (p - r) % 13;
            }
            rows.push(row);
        }
        Self { rows }
    }

    /// Builds a 26-row tableau over a keyed alphabet (the Quagmire III
    /// shape): row `r` maps a plaintext letter to the keyed alphabet
    /// entry `r` places further along.
    ///
    /// The keyed alphabet is derived from the keyword in the usual way:
    /// keyword letters first (duplicates dropped), then the remaining
    /// letters in order.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintError::NotALetter` if the keyword contains a
    /// non-alphabetic character.
    pub fn keyed(keyword: &str) -> Result<Self, ConstraintError> {
        let mut alphabet = Vec::with_capacity(26);
        let mut used = [false; 26];
        for ch in keyword.chars() {
            let letter = Letter::from_char(ch)?;
            if !used[usize::from(letter.value())] {
                used[usize::from(letter.value())] = true;
                alphabet.push(letter.value());
            }
        }
        for value in 0..ALPHABET_LEN {
            if !used[usize::from(value)] {
                alphabet.push(value);
            }
        }

        // Position of each plain letter within the keyed alphabet.
        let mut index_of = [0u8; 26];
        for (i, &value) in alphabet.iter().enumerate() {
            index_of[usize::from(value)] = i as u8;
        }

        let mut rows = Vec::with_capacity(26);
        for r in 0u8..ALPHABET_LEN {
            let mut row = [0u8; 26];
            for p in 0..ALPHABET_LEN {
                let shifted = (index_of[usize::from(p)] + r) % ALPHABET_LEN;
                row[usize::from(p)] = alphabet[usize::from(shifted)];
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }

    /// Number of rows, i.e. the size of the key space.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn encrypt_row(&self, row: u8, p: Letter) -> Letter {
        let row = &self.rows[usize::from(row) % self.rows.len()];
        Letter::from_residue(row[usize::from(p.value())])
    }

    fn decrypt_row(&self, row: u8, c: Letter) -> Letter {
        let row = &self.rows[usize::from(row) % self.rows.len()];
        // Rows are bijections, so the scan always finds the symbol.
        let p = row.iter().position(|&x| x == c.value());
        debug_assert!(p.is_some());
        Letter::from_residue(p.unwrap_or(0) as u8)
    }

    fn solve_row(&self, p: Letter, c: Letter) -> Option<u8> {
        self.rows
            .iter()
            .position(|row| row[usize::from(p.value())] == c.value())
            .map(|row| row as u8)
    }
}

impl TryFrom<Vec<[u8; 26]>> for Tableau {
    type Error = ConfigError;

    fn try_from(rows: Vec<[u8; 26]>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Tableau> for Vec<[u8; 26]> {
    fn from(tableau: Tableau) -> Self {
        tableau.rows
    }
}

/// A cipher family: how a key residue combines with a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Family {
    /// `c = p + k` (mod 26).
    Vigenere,

    /// `c = k − p` (mod 26); reciprocal.
    Beaufort,

    /// `c = p − k` (mod 26).
    VariantBeaufort,

    /// Row lookup in a tableau; the key residue is the row index.
    TableKeyed {
        /// The validated cipher table.
        table: Tableau,
    },
}

impl Family {
    /// Encrypts one symbol with the given key residue.
    ///
    /// The residue is reduced into the family's key space.
    #[must_use]
    pub fn encrypt(&self, p: Letter, k: u8) -> Letter {
        match self {
            Self::Vigenere => Letter::from_residue(add_mod(p.value(), k % ALPHABET_LEN)),
            Self::Beaufort => Letter::from_residue(sub_mod(k % ALPHABET_LEN, p.value())),
            Self::VariantBeaufort => Letter::from_residue(sub_mod(p.value(), k % ALPHABET_LEN)),
            Self::TableKeyed { table } => table.encrypt_row(k, p),
        }
    }

    /// Decrypts one symbol with the given key residue.
    #[must_use]
    pub fn decrypt(&self, c: Letter, k: u8) -> Letter {
        match self {
            Self::Vigenere => Letter::from_residue(sub_mod(c.value(), k % ALPHABET_LEN)),
            Self::Beaufort => Letter::from_residue(sub_mod(k % ALPHABET_LEN, c.value())),
            Self::VariantBeaufort => Letter::from_residue(add_mod(c.value(), k % ALPHABET_LEN)),
            Self::TableKeyed { table } => table.decrypt_row(k, c),
        }
    }

    /// Recovers the key residue that maps `p` to `c`, if one exists.
    ///
    /// For the additive families the residue always exists and is unique.
    /// For table-keyed families the first row mapping `p` to `c` is
    /// returned; `None` means no row does, i.e. the requirement is
    /// unsatisfiable under this table.
    #[must_use]
    pub fn solve_key(&self, p: Letter, c: Letter) -> Option<u8> {
        match self {
            Self::Vigenere => Some(sub_mod(c.value(), p.value())),
            Self::Beaufort => Some(add_mod(p.value(), c.value())),
            Self::VariantBeaufort => Some(sub_mod(p.value(), c.value())),
            Self::TableKeyed { table } => table.solve_row(p, c),
        }
    }

    /// True for the three arithmetic families, false for table lookups.
    ///
    /// Drives the identity-residue ("Option-A") forcing policy, which
    /// only makes sense where residue zero means pass-through.
    #[must_use]
    pub const fn is_additive(&self) -> bool {
        !matches!(self, Self::TableKeyed { .. })
    }

    /// Size of this family's key space.
    #[must_use]
    pub fn key_space(&self) -> usize {
        match self {
            Self::Vigenere | Self::Beaufort | Self::VariantBeaufort => usize::from(ALPHABET_LEN),
            Self::TableKeyed { table } => table.row_count(),
        }
    }

    /// Stable lowercase label used in combination identifiers.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Vigenere => "vigenere",
            Self::Beaufort => "beaufort",
            Self::VariantBeaufort => "variant_beaufort",
            Self::TableKeyed { .. } => "table_keyed",
        }
    }
}
