//! Error types for keywheel.
//!
//! All hard failures are strongly typed using thiserror. Expected
//! negative outcomes of exploring a hypothesis space — slot collisions
//! and illegal residues — are *not* errors; they are recorded as data
//! (see [`crate::collision`]) and never abort a search.

use thiserror::Error;

/// Errors raised while constructing or applying a transposition route.
///
/// All of these are detected once, at route construction or admission
/// time, never per character.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The permutation table does not cover the full text length.
    #[error("route '{route_id}': order has length {found}, expected {expected}")]
    LengthMismatch {
        /// Identifier of the offending route.
        route_id: String,
        /// Length the caller required.
        expected: usize,
        /// Length the order table actually has.
        found: usize,
    },

    /// The order table repeats or skips a position.
    #[error("route '{route_id}': order is not a permutation (entry {position} repeated or out of range)")]
    NotAPermutation {
        /// Identifier of the offending route.
        route_id: String,
        /// First offending entry.
        position: usize,
    },

    /// An excluded position lies outside the text.
    #[error("route '{route_id}': excluded position {position} is out of range")]
    ExcludedOutOfRange {
        /// Identifier of the offending route.
        route_id: String,
        /// The out-of-range position.
        position: usize,
    },

    /// An excluded position is not a fixed point of the permutation.
    #[error("route '{route_id}': excluded position {position} is moved by the permutation")]
    ExcludedNotFixed {
        /// Identifier of the offending route.
        route_id: String,
        /// The moved position.
        position: usize,
    },

    /// The permutation moves positions the caller declared protected.
    #[error("route '{route_id}': permutation moves {count} protected position(s), first at {first}")]
    DomainOverlap {
        /// Identifier of the offending route.
        route_id: String,
        /// Number of protected positions moved.
        count: usize,
        /// Lowest moved protected position.
        first: usize,
    },
}

/// Errors raised by malformed constraints or text.
///
/// Unlike collisions, these indicate invalid input rather than an
/// interesting negative result, and abort the offending search before
/// any wheel work begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConstraintError {
    /// A constraint points outside the ciphertext.
    #[error("constraint index {index} is out of bounds for text of length {len}")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The ciphertext length.
        len: usize,
    },

    /// A raw symbol value does not encode a letter.
    #[error("symbol value {value} is outside the 26-letter alphabet")]
    SymbolOutOfRange {
        /// The offending value.
        value: u8,
    },

    /// A character cannot be mapped into the alphabet.
    #[error("character '{ch}' is not a letter of the alphabet")]
    NotALetter {
        /// The offending character.
        ch: char,
    },
}

/// Errors raised by invalid solver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A tableau was constructed with no rows at all.
    #[error("tableau has no rows")]
    EmptyTableau,

    /// A tableau row is not a bijection on the alphabet.
    #[error("tableau row {row} is not a permutation of the alphabet")]
    InvalidTableauRow {
        /// Index of the offending row.
        row: usize,
    },

    /// A wheel was configured with period zero.
    #[error("wheel period must be non-zero")]
    ZeroPeriod,

    /// A wheel phase does not fit its period.
    #[error("phase {phase} is out of range for period {period}")]
    PhaseOutOfRange {
        /// The offending phase.
        phase: usize,
        /// The wheel period.
        period: usize,
    },

    /// A per-class family plan does not match the classing scheme.
    #[error("family plan supplies {found} families for {expected} classes")]
    FamilyPlanMismatch {
        /// Classes the scheme produces.
        expected: usize,
        /// Families the plan supplies.
        found: usize,
    },

    /// A position mapped to a class with no wheel.
    #[error("no wheel exists for class {class_id}")]
    UnknownClass {
        /// The unmatched class id.
        class_id: usize,
    },

    /// Re-encryption was asked of a wheel slot that was never forced.
    #[error("wheel for class {class_id} has no residue at slot {slot}")]
    UnknownSlot {
        /// Class of the incomplete wheel.
        class_id: usize,
        /// The empty slot.
        slot: usize,
    },

    /// A text does not match the length a wheel bank was built for.
    #[error("text has length {found}, but the wheel bank was built for {expected}")]
    TextLengthMismatch {
        /// Length the bank was built for.
        expected: usize,
        /// Length of the supplied text.
        found: usize,
    },

    /// Autokey feedback with delay zero would self-reference.
    #[error("autokey delay must be non-zero")]
    ZeroAutokeyDelay,

    /// A search space was built with an empty axis.
    #[error("search space dimension '{dimension}' is empty")]
    EmptySearchDimension {
        /// Name of the empty axis.
        dimension: &'static str,
    },
}

/// Top-level error type for keywheel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// A route failed validation or admission.
    #[error("route error: {0}")]
    Route(#[from] RouteError),

    /// A constraint set was malformed.
    #[error("constraint error: {0}")]
    Constraint(#[from] ConstraintError),

    /// The solver configuration was invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A record could not be serialized.
    #[error("serialization error: {message}")]
    Serialization {
        /// What went wrong.
        message: String,
    },
}

impl SolverError {
    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns true if this is a route error.
    #[must_use]
    pub const fn is_route(&self) -> bool {
        matches!(self, Self::Route(_))
    }

    /// Returns true if this is a constraint error.
    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for keywheel operations.
pub type SolverResult<T> = Result<T, SolverError>;
