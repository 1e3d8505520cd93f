//! The constraint forcer.
//!
//! Forcing maps a known-plaintext constraint to its wheel slot through
//! the route, recovers the residue the family relation requires, and
//! records it — or rejects the requirement with a collision or
//! illegal-residue event. Rejections are data, never errors: only a
//! malformed constraint set aborts forcing.

use serde::{Deserialize, Serialize};

use crate::alphabet::Letter;
use crate::collision::{
    CollisionEvent, IllegalResidueEvent, Infeasibility, ResidueRejection,
};
use crate::constraint::{validate_all, Constraint};
use crate::error::{ConfigError, RouteError, SolverResult};
use crate::route::Route;
use crate::wheel::WheelBank;

/// Validation policy applied to forced residues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcingPolicy {
    /// Reject residue zero for additive families (a pass-through key).
    ///
    /// Configurable validation, not a solver invariant: table-keyed
    /// families are never affected.
    #[serde(default)]
    pub forbid_identity_residue: bool,
}

impl ForcingPolicy {
    /// The permissive default policy.
    #[must_use]
    pub const fn permissive() -> Self {
        Self {
            forbid_identity_residue: false,
        }
    }

    /// The policy disallowing identity residues for additive families.
    #[must_use]
    pub const fn no_identity() -> Self {
        Self {
            forbid_identity_residue: true,
        }
    }
}

/// What forcing one constraint did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ForceEffect {
    /// The slot was empty and now holds the required residue.
    Recorded {
        /// Class of the written wheel.
        class_id: usize,
        /// Written slot.
        slot: usize,
        /// The recorded residue.
        residue: u8,
    },

    /// The slot already held exactly the required residue.
    Corroborated {
        /// Class of the wheel.
        class_id: usize,
        /// The corroborated slot.
        slot: usize,
        /// The existing residue.
        residue: u8,
    },

    /// The requirement cannot be accepted; the combination is
    /// infeasible.
    Rejected(Infeasibility),
}

impl ForceEffect {
    /// Returns true when the constraint was absorbed without conflict.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Aggregate outcome of forcing a constraint set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcingSummary {
    /// Slots newly written.
    pub recorded: usize,

    /// Constraints that agreed with an already-forced slot.
    pub corroborated: usize,

    /// Every rejection, in forcing order.
    pub infeasibilities: Vec<Infeasibility>,
}

impl ForcingSummary {
    /// True when no constraint was rejected.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.infeasibilities.is_empty()
    }
}

/// Forces constraints into a wheel bank.
///
/// Holds the bank mutably for the duration of one combination's forcing
/// pass; text and route lengths are checked once here, not per
/// constraint.
pub struct Forcer<'a> {
    bank: &'a mut WheelBank,
    ciphertext: &'a [Letter],
    route: Option<&'a Route>,
    policy: ForcingPolicy,
}

impl<'a> Forcer<'a> {
    /// Creates a forcer over one combination's bank.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TextLengthMismatch` when the ciphertext
    /// does not match the bank, or `RouteError::LengthMismatch` when the
    /// route does not cover the text.
    pub fn new(
        bank: &'a mut WheelBank,
        ciphertext: &'a [Letter],
        route: Option<&'a Route>,
        policy: ForcingPolicy,
    ) -> SolverResult<Self> {
        if ciphertext.len() != bank.text_len() {
            return Err(ConfigError::TextLengthMismatch {
                expected: bank.text_len(),
                found: ciphertext.len(),
            }
            .into());
        }
        if let Some(route) = route {
            if route.len() != ciphertext.len() {
                return Err(RouteError::LengthMismatch {
                    route_id: route.id().to_string(),
                    expected: ciphertext.len(),
                    found: route.len(),
                }
                .into());
            }
        }
        Ok(Self {
            bank,
            ciphertext,
            route,
            policy,
        })
    }

    /// Forces one constraint.
    ///
    /// # Errors
    ///
    /// Returns a `ConstraintError` for an out-of-bounds index — caller
    /// error, fatal. Collisions and illegal residues come back as
    /// [`ForceEffect::Rejected`], not as errors.
    pub fn force(&mut self, constraint: &Constraint) -> SolverResult<ForceEffect> {
        constraint.validate(self.ciphertext.len())?;

        let index = constraint.index;
        let schedule_position = self
            .route
            .map_or(index, |route| route.wheel_position(index));
        let ciphertext_symbol = self.ciphertext[index];

        let wheel = self.bank.wheel_at_mut(schedule_position)?;
        let class_id = wheel.class_id();
        let slot = wheel.slot_index(schedule_position);

        let Some(residue) = wheel.family().solve_key(constraint.plaintext, ciphertext_symbol)
        else {
            return Ok(ForceEffect::Rejected(Infeasibility::IllegalResidue(
                IllegalResidueEvent {
                    class_id,
                    slot,
                    residue: None,
                    position: index,
                    rejection: ResidueRejection::NoConsistentResidue,
                },
            )));
        };

        if self.policy.forbid_identity_residue && wheel.family().is_additive() && residue == 0 {
            return Ok(ForceEffect::Rejected(Infeasibility::IllegalResidue(
                IllegalResidueEvent {
                    class_id,
                    slot,
                    residue: Some(0),
                    position: index,
                    rejection: ResidueRejection::IdentityForbidden,
                },
            )));
        }

        match wheel.residue(slot) {
            None => {
                wheel.record(slot, residue, index, constraint.provenance);
                Ok(ForceEffect::Recorded {
                    class_id,
                    slot,
                    residue,
                })
            }
            Some(existing) if existing == residue => {
                wheel.corroborate(slot, index, constraint.provenance);
                Ok(ForceEffect::Corroborated {
                    class_id,
                    slot,
                    residue,
                })
            }
            Some(existing) => {
                let mut positions: Vec<usize> =
                    wheel.sources(slot).iter().map(|s| s.position).collect();
                positions.push(index);
                Ok(ForceEffect::Rejected(Infeasibility::Collision(
                    CollisionEvent {
                        class_id,
                        slot,
                        existing,
                        conflicting: residue,
                        positions,
                    },
                )))
            }
        }
    }

    /// Forces a whole constraint set, collecting every rejection.
    ///
    /// The set is validated in full before any slot is written, so a
    /// malformed set aborts with no wheel work done. After a rejection
    /// the remaining constraints are still examined — the event list is
    /// exact — but a combination with any rejection is infeasible and
    /// its bank must not be used for derivation.
    ///
    /// # Errors
    ///
    /// Returns a `ConstraintError` for a malformed set.
    pub fn force_all(&mut self, constraints: &[Constraint]) -> SolverResult<ForcingSummary> {
        validate_all(constraints, self.ciphertext.len())?;

        let mut summary = ForcingSummary::default();
        for constraint in constraints {
            match self.force(constraint)? {
                ForceEffect::Recorded { .. } => summary.recorded += 1,
                ForceEffect::Corroborated { .. } => summary.corroborated += 1,
                ForceEffect::Rejected(event) => summary.infeasibilities.push(event),
            }
        }
        Ok(summary)
    }
}
