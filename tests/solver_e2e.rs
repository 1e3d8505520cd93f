//! End-to-end pipeline tests over a 97-character scenario.
//!
//! The fixture mimics the shape of a real partially-anchored cryptogram:
//! four anchor spans covering 24 positions, a 23-character known tail,
//! and a six-class parity/triality schedule. The underlying system has
//! period 15, so solving at the "wrong" period 17 exercises the
//! injective no-propagation case while period 15 exercises slot reuse
//! and full closure.

use keywheel::{
    derive_autokey, encrypt, Autokey, ClassingScheme, Constraint, Family, FamilyPlan, Letter,
    Provenance, Route, Solver,
};

const TEXT_LEN: usize = 97;
const TRUE_PERIOD: usize = 15;

/// Residue of the generating system for a schedule position.
fn true_residue(position: usize) -> u8 {
    let class = (position % 2) * 3 + position % 3;
    let slot = position % TRUE_PERIOD;
    ((class * 5 + slot * 3) % 25 + 1) as u8
}

fn true_plaintext() -> Vec<Letter> {
    (0..TEXT_LEN)
        .map(|i| Letter::new(((i * 11 + 4) % 26) as u8).unwrap())
        .collect()
}

fn ciphertext() -> Vec<Letter> {
    true_plaintext()
        .iter()
        .enumerate()
        .map(|(i, &p)| Family::Vigenere.encrypt(p, true_residue(i)))
        .collect()
}

/// Four anchors (24 positions) plus a 23-character tail: 47 constraints.
fn constraints() -> Vec<Constraint> {
    let plaintext = true_plaintext();
    let mut constraints = Vec::new();
    for span in [21..25, 25..34, 63..69, 69..74] {
        for i in span {
            constraints.push(Constraint::new(i, plaintext[i], Provenance::Anchor));
        }
    }
    for i in 74..97 {
        constraints.push(Constraint::new(i, plaintext[i], Provenance::Tail));
    }
    constraints
}

fn solve_at(period: usize) -> keywheel::Solution {
    let ciphertext = ciphertext();
    let constraints = constraints();
    Solver::new(&ciphertext, &constraints)
        .solve(
            None,
            ClassingScheme::ParityTriality,
            &FamilyPlan::uniform(Family::Vigenere),
            period,
            0,
        )
        .unwrap()
}

#[test]
fn coprime_period_forces_without_propagation() {
    // lcm(6, 17) = 102 > 97: the (class, slot) map is injective, so 47
    // non-colliding constraints force exactly 47 positions and the
    // closure bound is exactly the unknown count.
    let solution = solve_at(17);

    assert!(solution.is_feasible());
    assert!(!solution.is_closed());
    assert_eq!(solution.forced_count(), 47);

    let report = &solution.closure;
    assert!(report.injective);
    assert_eq!(report.single_use_slots, 97);
    assert_eq!(report.reused_slots, 0);
    assert_eq!(report.unknown_count, 50);
    assert_eq!(report.unknown_positions.len(), 50);
    assert_eq!(report.min_additional_constraints, 50);
}

#[test]
fn reused_period_propagates_to_full_closure() {
    // Under period 15 the same 47 constraints cover all 30 reachable
    // (class, slot) pairs, so every position is determined.
    let solution = solve_at(TRUE_PERIOD);

    assert!(solution.is_feasible());
    assert!(solution.is_closed());
    assert_eq!(solution.forced_count(), 97);
    assert_eq!(solution.closure.min_additional_constraints, 0);
    assert_eq!(solution.closure.reused_slots, 30);
    assert_eq!(solution.closure.single_use_slots, 0);

    let derived: Vec<Letter> = solution
        .derivation
        .plaintext
        .iter()
        .map(|p| p.unwrap())
        .collect();
    assert_eq!(derived, true_plaintext());
}

#[test]
fn closed_solutions_round_trip_to_the_ciphertext() {
    let solution = solve_at(TRUE_PERIOD);
    assert!(solution.is_closed());

    let derived: Vec<Letter> = solution
        .derivation
        .plaintext
        .iter()
        .map(|p| p.unwrap())
        .collect();
    let reencrypted = encrypt(&solution.wheel_bank, &derived, None).unwrap();
    assert_eq!(reencrypted, ciphertext());
}

#[test]
fn identical_runs_are_bit_identical() {
    let a = solve_at(TRUE_PERIOD);
    let b = solve_at(TRUE_PERIOD);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn conflicting_hypothesis_collides_in_either_order() {
    // Position 0 shares its period-15 slot with constrained positions
    // 30 and 90. A hypothesis one letter off the true plaintext demands
    // a different residue there.
    let ciphertext = ciphertext();
    let plaintext = true_plaintext();
    let wrong = Letter::new((plaintext[0].value() + 1) % 26).unwrap();
    let hypothesis = Constraint::new(0, wrong, Provenance::Hypothesis);

    let mut first = vec![hypothesis];
    first.extend(constraints());
    let mut last = constraints();
    last.push(hypothesis);

    for ordered in [first, last] {
        let solution = Solver::new(&ciphertext, &ordered)
            .solve(
                None,
                ClassingScheme::ParityTriality,
                &FamilyPlan::uniform(Family::Vigenere),
                TRUE_PERIOD,
                0,
            )
            .unwrap();
        assert!(!solution.is_feasible());
        let collision = solution
            .infeasibilities
            .iter()
            .find(|e| e.is_collision())
            .expect("expected a collision event");
        assert_eq!(collision.class_id(), 0);
        assert_eq!(collision.slot(), 0);
        // Abandoned combinations derive nothing.
        assert_eq!(solution.forced_count(), 0);
    }
}

#[test]
fn routed_schedule_still_closes() {
    // Re-encrypt the true plaintext through a reversal route using the
    // fully forced bank, then solve against the routed ciphertext.
    let baseline = solve_at(TRUE_PERIOD);
    let route = Route::new("reversal", (0..TEXT_LEN).rev().collect(), []).unwrap();
    let plaintext = true_plaintext();
    let routed_ciphertext = encrypt(&baseline.wheel_bank, &plaintext, Some(&route)).unwrap();
    assert_ne!(routed_ciphertext, ciphertext());

    let constraints = constraints();
    let solution = Solver::new(&routed_ciphertext, &constraints)
        .solve(
            Some(&route),
            ClassingScheme::ParityTriality,
            &FamilyPlan::uniform(Family::Vigenere),
            TRUE_PERIOD,
            0,
        )
        .unwrap();

    assert!(solution.is_feasible());
    assert!(solution.is_closed());
    let derived: Vec<Letter> = solution
        .derivation
        .plaintext
        .iter()
        .map(|p| p.unwrap())
        .collect();
    assert_eq!(derived, plaintext);

    let reencrypted = encrypt(&solution.wheel_bank, &derived, Some(&route)).unwrap();
    assert_eq!(reencrypted, routed_ciphertext);
}

#[test]
fn route_invertibility_over_the_scenario_text() {
    let route = Route::new("reversal", (0..TEXT_LEN).rev().collect(), []).unwrap();
    let text = ciphertext();
    let routed = route.apply(&text).unwrap();
    assert_eq!(route.invert(&routed).unwrap(), text);
}

#[test]
fn autokey_extends_the_coprime_solution_deterministically() {
    // At period 17 positions 0..21 and 34..63 stay unknown. With delay
    // 1, only position 34 has a determined predecessor (33), so each
    // feedback pass extends the run by one: 34, 35, 36.
    let ciphertext = ciphertext();
    let constraints = constraints();
    let bank = Solver::new(&ciphertext, &constraints)
        .solve(
            None,
            ClassingScheme::ParityTriality,
            &FamilyPlan::uniform(Family::Vigenere),
            17,
            0,
        )
        .unwrap()
        .wheel_bank;

    let derivation = derive_autokey(
        &bank,
        &ciphertext,
        None,
        Autokey {
            delay: 1,
            max_passes: 3,
        },
    )
    .unwrap();

    assert_eq!(derivation.forced_count, 50);
    assert_eq!(derivation.passes, 4);
    let unknowns = derivation.unknown_positions();
    assert!(!unknowns.contains(&34));
    assert!(!unknowns.contains(&36));
    assert!(unknowns.contains(&37));

    // The autokey letters obey the running-key relation.
    let p33 = derivation.plaintext[33].unwrap();
    let p34 = derivation.plaintext[34].unwrap();
    assert_eq!(p34, Family::Vigenere.decrypt(ciphertext[34], p33.value()));
}
