//! Infeasibility events: collisions and illegal residues.
//!
//! These are explicit objects, not hidden errors. When two constraints
//! disagree on a wheel slot, the solver does not silently overwrite or
//! pick a winner — it records a [`CollisionEvent`], marks the combination
//! infeasible, and the enumeration moves on. The same holds for residues
//! rejected by policy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Two constraints required different residues at the same wheel slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Class of the wheel holding the slot.
    pub class_id: usize,

    /// Slot index within the wheel.
    pub slot: usize,

    /// Residue already recorded at the slot.
    pub existing: u8,

    /// Residue the disagreeing constraint required.
    pub conflicting: u8,

    /// Every text position bound to the slot: the positions that forced
    /// or corroborated the existing value, then the disagreeing position
    /// last.
    pub positions: Vec<usize>,
}

impl CollisionEvent {
    /// The position whose requirement disagreed, if recorded.
    #[must_use]
    pub fn disagreeing_position(&self) -> Option<usize> {
        self.positions.last().copied()
    }
}

impl fmt::Display for CollisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "collision at class {} slot {}: residue {} vs {} (positions {:?})",
            self.class_id, self.slot, self.existing, self.conflicting, self.positions
        )
    }
}

/// Why a residue was rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidueRejection {
    /// Residue zero for an additive family: a pass-through key,
    /// disallowed under the identity-residue policy.
    IdentityForbidden,

    /// No key residue maps the required plaintext to the ciphertext
    /// under a table-keyed family.
    NoConsistentResidue,
}

impl fmt::Display for ResidueRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityForbidden => write!(f, "identity_forbidden"),
            Self::NoConsistentResidue => write!(f, "no_consistent_residue"),
        }
    }
}

/// A constraint demanded a residue the configuration cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IllegalResidueEvent {
    /// Class of the wheel holding the slot.
    pub class_id: usize,

    /// Slot index within the wheel.
    pub slot: usize,

    /// The rejected residue, where one was computable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residue: Option<u8>,

    /// The text position whose constraint was rejected.
    pub position: usize,

    /// Why the residue was rejected.
    pub rejection: ResidueRejection,
}

impl fmt::Display for IllegalResidueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal residue at class {} slot {} (position {}): {}",
            self.class_id, self.slot, self.position, self.rejection
        )
    }
}

/// A recorded reason a combination is infeasible.
///
/// Infeasibility is an expected outcome of exploring a hypothesis space.
/// It never propagates as an error; it is data in the result record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Infeasibility {
    /// Conflicting requirements on one slot.
    Collision(CollisionEvent),

    /// A requirement no legal residue satisfies.
    IllegalResidue(IllegalResidueEvent),
}

impl Infeasibility {
    /// Returns true for a slot collision.
    #[must_use]
    pub const fn is_collision(&self) -> bool {
        matches!(self, Self::Collision(_))
    }

    /// Returns true for a rejected residue.
    #[must_use]
    pub const fn is_illegal_residue(&self) -> bool {
        matches!(self, Self::IllegalResidue(_))
    }

    /// The wheel class the event occurred in.
    #[must_use]
    pub const fn class_id(&self) -> usize {
        match self {
            Self::Collision(e) => e.class_id,
            Self::IllegalResidue(e) => e.class_id,
        }
    }

    /// The slot the event occurred at.
    #[must_use]
    pub const fn slot(&self) -> usize {
        match self {
            Self::Collision(e) => e.slot,
            Self::IllegalResidue(e) => e.slot,
        }
    }
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collision(e) => write!(f, "{e}"),
            Self::IllegalResidue(e) => write!(f, "{e}"),
        }
    }
}
