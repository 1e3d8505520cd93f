//! Closure analysis: what a wheel bank determines, and what it provably
//! cannot.
//!
//! The load-bearing fact: whether one forced position can ever determine
//! another depends on the injectivity of `i ↦ (class(i), slot(i))` over
//! the text. If the mapping is injective, forcing a position never
//! propagates, and full closure needs exactly one additional constraint
//! per unknown position — a proved lower bound, not a heuristic. Where
//! slots are reused the analyzer reports the distinct coverage instead,
//! making the cheaper bound provable rather than asserted.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::derive::Derivation;
use crate::error::{ConfigError, RouteError, SolverResult};
use crate::route::Route;
use crate::wheel::WheelBank;

/// What a wheel bank determines over a text, and the cost of closing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureReport {
    /// Length of the analyzed text.
    pub text_len: usize,

    /// True when every position is determined.
    pub closure: bool,

    /// Number of undetermined positions.
    pub unknown_count: usize,

    /// Undetermined positions, ascending.
    pub unknown_positions: Vec<usize>,

    /// True when no `(class, slot)` pair serves two positions.
    pub injective: bool,

    /// Pairs serving exactly one position.
    pub single_use_slots: usize,

    /// Pairs serving two or more positions.
    pub reused_slots: usize,

    /// Distinct pairs covering the unknown positions.
    pub undetermined_slots: usize,

    /// Provable minimum number of further constraints needed for full
    /// closure under the wheel schedule. Equals `unknown_count` exactly
    /// when the mapping is injective.
    pub min_additional_constraints: usize,
}

/// Analyzes slot coverage and closure bounds for one combination.
///
/// # Errors
///
/// Returns length-mismatch or unknown-class configuration errors.
pub fn analyze(
    bank: &WheelBank,
    derivation: &Derivation,
    route: Option<&Route>,
) -> SolverResult<ClosureReport> {
    let text_len = derivation.plaintext.len();
    if text_len != bank.text_len() {
        return Err(ConfigError::TextLengthMismatch {
            expected: bank.text_len(),
            found: text_len,
        }
        .into());
    }
    if let Some(route) = route {
        if route.len() != text_len {
            return Err(RouteError::LengthMismatch {
                route_id: route.id().to_string(),
                expected: text_len,
                found: route.len(),
            }
            .into());
        }
    }

    let pair_of = |index: usize| -> SolverResult<(usize, usize)> {
        let schedule_position = route.map_or(index, |r| r.wheel_position(index));
        let wheel = bank.wheel_at(schedule_position)?;
        Ok((wheel.class_id(), wheel.slot_index(schedule_position)))
    };

    let mut multiplicity: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for index in 0..text_len {
        *multiplicity.entry(pair_of(index)?).or_insert(0) += 1;
    }
    let single_use_slots = multiplicity.values().filter(|&&m| m == 1).count();
    let reused_slots = multiplicity.values().filter(|&&m| m > 1).count();
    let injective = reused_slots == 0;

    let unknown_positions = derivation.unknown_positions();
    let mut undetermined: BTreeSet<(usize, usize)> = BTreeSet::new();
    for &index in &unknown_positions {
        undetermined.insert(pair_of(index)?);
    }
    let undetermined_slots = undetermined.len();

    Ok(ClosureReport {
        text_len,
        closure: derivation.is_closed(),
        unknown_count: unknown_positions.len(),
        unknown_positions,
        injective,
        single_use_slots,
        reused_slots,
        undetermined_slots,
        min_additional_constraints: undetermined_slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::parse_text;
    use crate::classing::ClassingScheme;
    use crate::constraint::Provenance;
    use crate::derive::derive;
    use crate::family::Family;
    use crate::wheel::FamilyPlan;

    fn make_bank(text_len: usize, period: usize) -> WheelBank {
        WheelBank::uniform(
            ClassingScheme::Identity,
            text_len,
            &FamilyPlan::uniform(Family::Vigenere),
            period,
            0,
        )
        .unwrap()
    }

    #[test]
    fn injective_schedule_gives_exact_bound() {
        // Period 5 over 3 positions: every pair single-use.
        let ciphertext = parse_text("XYZ").unwrap();
        let bank = make_bank(3, 5);
        let derivation = derive(&bank, &ciphertext, None).unwrap();
        let report = analyze(&bank, &derivation, None).unwrap();

        assert!(report.injective);
        assert_eq!(report.single_use_slots, 3);
        assert_eq!(report.reused_slots, 0);
        assert_eq!(report.unknown_count, 3);
        assert_eq!(report.min_additional_constraints, 3);
        assert!(!report.closure);
    }

    #[test]
    fn reused_slots_lower_the_bound() {
        // Period 5 over 10 positions: every pair serves two positions,
        // so closing 10 unknowns needs only 5 constraints.
        let ciphertext = parse_text("XYZXYZXYZX").unwrap();
        let bank = make_bank(10, 5);
        let derivation = derive(&bank, &ciphertext, None).unwrap();
        let report = analyze(&bank, &derivation, None).unwrap();

        assert!(!report.injective);
        assert_eq!(report.single_use_slots, 0);
        assert_eq!(report.reused_slots, 5);
        assert_eq!(report.unknown_count, 10);
        assert_eq!(report.undetermined_slots, 5);
        assert_eq!(report.min_additional_constraints, 5);
    }

    #[test]
    fn forcing_shrinks_the_unknown_side_only() {
        let ciphertext = parse_text("XYZXYZXYZX").unwrap();
        let mut bank = make_bank(10, 5);
        let wheel = bank.wheel_at_mut(0).unwrap();
        wheel.record(0, 4, 0, Provenance::Anchor);
        wheel.record(1, 9, 1, Provenance::Anchor);

        let derivation = derive(&bank, &ciphertext, None).unwrap();
        let report = analyze(&bank, &derivation, None).unwrap();

        assert_eq!(report.unknown_count, 6);
        assert_eq!(report.unknown_positions, vec![2, 3, 4, 7, 8, 9]);
        assert_eq!(report.undetermined_slots, 3);
        assert_eq!(report.min_additional_constraints, 3);
        // Structural coverage is unchanged by forcing.
        assert_eq!(report.reused_slots, 5);
    }

    #[test]
    fn closed_banks_report_zero_cost() {
        let ciphertext = parse_text("XYZXY").unwrap();
        let mut bank = make_bank(5, 5);
        for slot in 0..5 {
            let wheel = bank.wheel_at_mut(slot).unwrap();
            wheel.record(slot, 3, slot, Provenance::Tail);
        }
        let derivation = derive(&bank, &ciphertext, None).unwrap();
        let report = analyze(&bank, &derivation, None).unwrap();

        assert!(report.closure);
        assert_eq!(report.unknown_count, 0);
        assert_eq!(report.min_additional_constraints, 0);
    }

    #[test]
    fn parity_triality_with_coprime_period_is_injective() {
        // lcm(6, 17) = 102 > 97: no (class, slot) pair repeats.
        let bank = WheelBank::uniform(
            ClassingScheme::ParityTriality,
            97,
            &FamilyPlan::uniform(Family::Vigenere),
            17,
            0,
        )
        .unwrap();
        let ciphertext = parse_text(&"A".repeat(97)).unwrap();
        let derivation = derive(&bank, &ciphertext, None).unwrap();
        let report = analyze(&bank, &derivation, None).unwrap();
        assert!(report.injective);
        assert_eq!(report.single_use_slots, 97);

        // Period 15 shares a factor with the class cycle: reuse appears.
        let bank = WheelBank::uniform(
            ClassingScheme::ParityTriality,
            97,
            &FamilyPlan::uniform(Family::Vigenere),
            15,
            0,
        )
        .unwrap();
        let derivation = derive(&bank, &ciphertext, None).unwrap();
        let report = analyze(&bank, &derivation, None).unwrap();
        assert!(!report.injective);
        assert_eq!(report.single_use_slots + report.reused_slots, 30);
    }
}
