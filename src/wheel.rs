//! Key wheels and the per-combination wheel bank.
//!
//! A wheel is the key schedule of one equivalence class: a cipher
//! family, a period, a phase, and one residue slot per periodic
//! position. Slots begin unknown and are only ever filled by the
//! constraint forcer. Each slot remembers every position that forced or
//! corroborated it, so collision events can name their witnesses.
//!
//! A [`WheelBank`] is built fresh for each candidate combination and
//! discarded after the result record is emitted; banks are never shared
//! across combinations.

use serde::{Deserialize, Serialize};

use crate::classing::ClassingScheme;
use crate::constraint::Provenance;
use crate::error::ConfigError;
use crate::family::Family;

/// One witness of a slot's residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSource {
    /// Original text position of the forcing constraint.
    pub position: usize,

    /// Provenance of that constraint.
    pub provenance: Provenance,
}

/// One periodic key-schedule position of a wheel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// The forced residue, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residue: Option<u8>,

    /// Every constraint position that forced or corroborated the
    /// residue, in forcing order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SlotSource>,
}

/// The key schedule of one equivalence class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wheel {
    class_id: usize,
    family: Family,
    period: usize,
    phase: usize,
    slots: Vec<Slot>,
}

impl Wheel {
    /// Creates a wheel with all slots unknown.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroPeriod` or
    /// `ConfigError::PhaseOutOfRange`.
    pub fn new(
        class_id: usize,
        family: Family,
        period: usize,
        phase: usize,
    ) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if phase >= period {
            return Err(ConfigError::PhaseOutOfRange { phase, period });
        }
        Ok(Self {
            class_id,
            family,
            period,
            phase,
            slots: vec![Slot::default(); period],
        })
    }

    /// Class this wheel serves.
    #[must_use]
    pub fn class_id(&self) -> usize {
        self.class_id
    }

    /// Cipher family of this wheel.
    #[must_use]
    pub fn family(&self) -> &Family {
        &self.family
    }

    /// Period length.
    #[must_use]
    pub fn period(&self) -> usize {
        self.period
    }

    /// Phase offset.
    #[must_use]
    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Slot index addressed by a key-schedule position.
    #[must_use]
    pub fn slot_index(&self, schedule_position: usize) -> usize {
        (schedule_position + self.phase) % self.period
    }

    /// Residue at a slot, if forced.
    #[must_use]
    pub fn residue(&self, slot: usize) -> Option<u8> {
        self.slots.get(slot).and_then(|s| s.residue)
    }

    /// Residue serving a key-schedule position, if forced.
    #[must_use]
    pub fn residue_at(&self, schedule_position: usize) -> Option<u8> {
        self.residue(self.slot_index(schedule_position))
    }

    /// Witnesses of a slot's residue.
    #[must_use]
    pub fn sources(&self, slot: usize) -> &[SlotSource] {
        self.slots.get(slot).map_or(&[], |s| s.sources.as_slice())
    }

    /// Number of slots holding a residue.
    #[must_use]
    pub fn known_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| s.residue.is_some()).count()
    }

    pub(crate) fn record(
        &mut self,
        slot: usize,
        residue: u8,
        position: usize,
        provenance: Provenance,
    ) {
        let slot = &mut self.slots[slot];
        slot.residue = Some(residue);
        slot.sources.push(SlotSource {
            position,
            provenance,
        });
    }

    pub(crate) fn corroborate(&mut self, slot: usize, position: usize, provenance: Provenance) {
        self.slots[slot].sources.push(SlotSource {
            position,
            provenance,
        });
    }
}

/// Per-class wheel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Cipher family of the class.
    pub family: Family,

    /// Period length of the class.
    pub period: usize,

    /// Phase offset of the class.
    pub phase: usize,
}

/// Assignment of cipher families to classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum FamilyPlan {
    /// Every class uses the same family.
    Uniform {
        /// The shared family.
        family: Family,
    },

    /// Class `i` uses `families[i]`.
    PerClass {
        /// One family per class, in class-id order.
        families: Vec<Family>,
    },
}

impl FamilyPlan {
    /// Convenience constructor for a uniform plan.
    #[must_use]
    pub const fn uniform(family: Family) -> Self {
        Self::Uniform { family }
    }

    /// Checks the plan against a class count.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::FamilyPlanMismatch` when a per-class plan
    /// does not supply exactly one family per class.
    pub fn validate(&self, class_count: usize) -> Result<(), ConfigError> {
        match self {
            Self::Uniform { .. } => Ok(()),
            Self::PerClass { families } => {
                if families.len() == class_count {
                    Ok(())
                } else {
                    Err(ConfigError::FamilyPlanMismatch {
                        expected: class_count,
                        found: families.len(),
                    })
                }
            }
        }
    }

    /// The family assigned to a class, if the plan covers it.
    #[must_use]
    pub fn family_for(&self, class_id: usize) -> Option<&Family> {
        match self {
            Self::Uniform { family } => Some(family),
            Self::PerClass { families } => families.get(class_id),
        }
    }

    /// Stable label for combination identifiers.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Uniform { family } => family.label().to_string(),
            Self::PerClass { families } => families
                .iter()
                .map(Family::label)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// All wheels of one candidate combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelBank {
    classing: ClassingScheme,
    text_len: usize,
    wheels: Vec<Wheel>,
}

impl WheelBank {
    /// Builds a bank from explicit per-class configurations.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::FamilyPlanMismatch` when the configuration
    /// count does not match the scheme's class count, or the underlying
    /// wheel construction error for a bad period/phase.
    pub fn new(
        classing: ClassingScheme,
        text_len: usize,
        configs: Vec<WheelConfig>,
    ) -> Result<Self, ConfigError> {
        let class_count = classing.class_count(text_len);
        if configs.len() != class_count {
            return Err(ConfigError::FamilyPlanMismatch {
                expected: class_count,
                found: configs.len(),
            });
        }
        let wheels = configs
            .into_iter()
            .enumerate()
            .map(|(class_id, config)| {
                Wheel::new(class_id, config.family, config.period, config.phase)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            classing,
            text_len,
            wheels,
        })
    }

    /// Builds a bank where every class shares one period and phase and
    /// families come from a plan.
    ///
    /// # Errors
    ///
    /// Returns plan-validation or wheel-construction errors.
    pub fn uniform(
        classing: ClassingScheme,
        text_len: usize,
        plan: &FamilyPlan,
        period: usize,
        phase: usize,
    ) -> Result<Self, ConfigError> {
        let class_count = classing.class_count(text_len);
        plan.validate(class_count)?;
        let configs = (0..class_count)
            .map(|class_id| {
                // validate() guarantees coverage of every class id.
                let family = plan
                    .family_for(class_id)
                    .ok_or(ConfigError::UnknownClass { class_id })?;
                Ok(WheelConfig {
                    family: family.clone(),
                    period,
                    phase,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Self::new(classing, text_len, configs)
    }

    /// The classing scheme the bank was built for.
    #[must_use]
    pub fn classing(&self) -> ClassingScheme {
        self.classing
    }

    /// Text length the bank was built for.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// All wheels, in class-id order.
    #[must_use]
    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    /// Number of classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.wheels.len()
    }

    /// The wheel of a class.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownClass` for an unmapped class id.
    pub fn wheel(&self, class_id: usize) -> Result<&Wheel, ConfigError> {
        self.wheels
            .get(class_id)
            .ok_or(ConfigError::UnknownClass { class_id })
    }

    /// The wheel serving a key-schedule position.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownClass` when the position maps to a
    /// class with no wheel.
    pub fn wheel_at(&self, schedule_position: usize) -> Result<&Wheel, ConfigError> {
        self.wheel(self.classing.class_of(schedule_position))
    }

    pub(crate) fn wheel_at_mut(&mut self, schedule_position: usize) -> Result<&mut Wheel, ConfigError> {
        let class_id = self.classing.class_of(schedule_position);
        self.wheels
            .get_mut(class_id)
            .ok_or(ConfigError::UnknownClass { class_id })
    }

    /// Total forced slots across all wheels.
    #[must_use]
    pub fn known_slot_count(&self) -> usize {
        self.wheels.iter().map(Wheel::known_slot_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_rejects_bad_period_and_phase() {
        assert_eq!(
            Wheel::new(0, Family::Vigenere, 0, 0),
            Err(ConfigError::ZeroPeriod)
        );
        assert_eq!(
            Wheel::new(0, Family::Vigenere, 17, 17),
            Err(ConfigError::PhaseOutOfRange {
                phase: 17,
                period: 17
            })
        );
    }

    #[test]
    fn slot_index_wraps_with_phase() {
        let wheel = Wheel::new(0, Family::Vigenere, 17, 3).unwrap();
        assert_eq!(wheel.slot_index(0), 3);
        assert_eq!(wheel.slot_index(14), 0);
        assert_eq!(wheel.slot_index(17), 3);
    }

    #[test]
    fn record_and_corroborate_track_sources() {
        let mut wheel = Wheel::new(2, Family::Beaufort, 5, 0).unwrap();
        assert_eq!(wheel.known_slot_count(), 0);

        wheel.record(1, 9, 31, Provenance::Anchor);
        wheel.corroborate(1, 36, Provenance::Tail);

        assert_eq!(wheel.residue(1), Some(9));
        assert_eq!(wheel.known_slot_count(), 1);
        let sources = wheel.sources(1);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].position, 31);
        assert_eq!(sources[1].provenance, Provenance::Tail);
    }

    #[test]
    fn uniform_bank_builds_one_wheel_per_class() {
        let bank = WheelBank::uniform(
            ClassingScheme::ParityTriality,
            97,
            &FamilyPlan::uniform(Family::Vigenere),
            17,
            0,
        )
        .unwrap();
        assert_eq!(bank.class_count(), 6);
        assert_eq!(bank.text_len(), 97);
        assert_eq!(bank.known_slot_count(), 0);
        assert_eq!(bank.wheel_at(7).unwrap().class_id(), 4);
    }

    #[test]
    fn per_class_plan_must_cover_all_classes() {
        let plan = FamilyPlan::PerClass {
            families: vec![Family::Vigenere, Family::Beaufort],
        };
        let err = WheelBank::uniform(ClassingScheme::ParityTriality, 97, &plan, 17, 0).unwrap_err();
        assert_eq!(
            err,
            ConfigError::FamilyPlanMismatch {
                expected: 6,
                found: 2
            }
        );
    }

    #[test]
    fn per_class_plan_assigns_by_class_id() {
        let families = vec![
            Family::Vigenere,
            Family::Beaufort,
            Family::VariantBeaufort,
            Family::Vigenere,
            Family::Beaufort,
            Family::VariantBeaufort,
        ];
        let plan = FamilyPlan::PerClass {
            families: families.clone(),
        };
        let bank =
            WheelBank::uniform(ClassingScheme::ParityTriality, 97, &plan, 17, 0).unwrap();
        for (class_id, family) in families.iter().enumerate() {
            assert_eq!(bank.wheel(class_id).unwrap().family(), family);
        }
        assert_eq!(plan.label(), "vigenere,beaufort,variant_beaufort,vigenere,beaufort,variant_beaufort");
    }

    #[test]
    fn unknown_class_is_an_error() {
        let bank = WheelBank::uniform(
            ClassingScheme::Identity,
            10,
            &FamilyPlan::uniform(Family::Vigenere),
            5,
            0,
        )
        .unwrap();
        assert!(bank.wheel(1).is_err());
    }

    #[test]
    fn bank_serde_round_trip() {
        let mut bank = WheelBank::uniform(
            ClassingScheme::Identity,
            10,
            &FamilyPlan::uniform(Family::Beaufort),
            5,
            1,
        )
        .unwrap();
        bank.wheel_at_mut(0).unwrap().record(1, 7, 0, Provenance::Anchor);

        let json = serde_json::to_string(&bank).unwrap();
        let back: WheelBank = serde_json::from_str(&json).unwrap();
        assert_eq!(bank, back);
        assert_eq!(back.wheel(0).unwrap().residue(1), Some(7));
    }
}
