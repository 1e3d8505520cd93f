//! End-to-end search tests: enumeration, records, receipts.

use keywheel::{
    ClassingScheme, Constraint, Family, FamilyPlan, Letter, Outcome, Phases, Provenance, Route,
    SearchOrchestrator, SearchSpace,
};

const TEXT_LEN: usize = 97;
const TRUE_PERIOD: usize = 15;

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

fn scenario_space() -> SearchSpace {
    SearchSpace::builder()
        .classing(ClassingScheme::ParityTriality)
        .plan(FamilyPlan::uniform(Family::Vigenere))
        .periods([15, 17])
        .phases(Phases::Explicit { phases: vec![0] })
        .build()
        .unwrap()
}

#[test]
fn search_separates_closing_and_open_periods() {
    let ciphertext = ciphertext();
    let constraints = constraints();
    let report = SearchOrchestrator::new(scenario_space())
        .run(&ciphertext, &constraints)
        .unwrap();

    assert_eq!(report.attempted(), 2);
    assert_eq!(report.feasible_count(), 2);
    assert_eq!(report.closed_count(), 1);

    let at_15 = &report.records[0];
    assert_eq!(at_15.combination.period, 15);
    assert!(at_15.is_closed());

    let at_17 = &report.records[1];
    assert_eq!(at_17.combination.period, 17);
    assert!(at_17.is_feasible());
    assert!(!at_17.is_closed());
    let solution = at_17.solution().unwrap();
    assert_eq!(solution.forced_count(), 47);
    assert_eq!(solution.closure.min_additional_constraints, 50);
}

#[test]
fn every_attempted_combination_gets_a_record() {
    // A wrong-family plan makes every period infeasible via collisions,
    // but records still appear for each point.
    let ciphertext = ciphertext();
    let constraints = constraints();
    let space = SearchSpace::builder()
        .classing(ClassingScheme::ParityTriality)
        .plan(FamilyPlan::uniform(Family::Beaufort))
        .periods([15, 17])
        .phases(Phases::Explicit { phases: vec![0] })
        .build()
        .unwrap();
    let report = SearchOrchestrator::new(space)
        .run(&ciphertext, &constraints)
        .unwrap();

    assert_eq!(report.attempted(), 2);
    for record in &report.records {
        assert!(record.solution().is_some());
    }
    // Period 15 reuses slots, so the Beaufort residues disagree; the
    // injective period 17 absorbs any one-residue-per-slot assignment.
    assert!(!report.records[0].is_feasible());
    assert!(report.records[1].is_feasible());
}

#[test]
fn parallel_and_sequential_reports_match() {
    let ciphertext = ciphertext();
    let constraints = constraints();
    let orchestrator = SearchOrchestrator::new(scenario_space());
    let sequential = orchestrator.run(&ciphertext, &constraints).unwrap();
    for workers in [1, 3, 8] {
        let parallel = orchestrator
            .run_parallel(&ciphertext, &constraints, workers)
            .unwrap();
        assert_eq!(sequential, parallel);
    }
}

#[test]
fn receipt_names_the_search_inputs() {
    let ciphertext = ciphertext();
    let constraints = constraints();
    let route = Route::new("reversal", (0..TEXT_LEN).rev().collect(), []).unwrap();
    let space = SearchSpace::builder()
        .without_route()
        .route(route.clone())
        .classing(ClassingScheme::ParityTriality)
        .plan(FamilyPlan::uniform(Family::Vigenere))
        .period(15)
        .phases(Phases::Explicit { phases: vec![0] })
        .build()
        .unwrap();

    let report = SearchOrchestrator::new(space)
        .run(&ciphertext, &constraints)
        .unwrap();
    assert!(report
        .receipt
        .verify(&ciphertext, std::slice::from_ref(&route))
        .unwrap());

    // Tampered inputs fail verification.
    let mut other = ciphertext.clone();
    other[0] = Letter::new((other[0].value() + 1) % 26).unwrap();
    assert!(!report
        .receipt
        .verify(&other, std::slice::from_ref(&route))
        .unwrap());
}

#[test]
fn na_only_policy_gates_routes_on_anchor_overlap() {
    let ciphertext = ciphertext();
    let constraints = constraints();

    // The reversal moves every anchor; a swap of two free positions
    // does not.
    let mut order: Vec<usize> = (0..TEXT_LEN).collect();
    order.swap(0, 1);
    let harmless = Route::new("head_swap", order, []).unwrap();
    let reversal = Route::new("reversal", (0..TEXT_LEN).rev().collect(), []).unwrap();

    let space = SearchSpace::builder()
        .route(reversal)
        .route(harmless)
        .classing(ClassingScheme::ParityTriality)
        .plan(FamilyPlan::uniform(Family::Vigenere))
        .period(15)
        .phases(Phases::Explicit { phases: vec![0] })
        .na_only()
        .build()
        .unwrap();
    let report = SearchOrchestrator::new(space)
        .run(&ciphertext, &constraints)
        .unwrap();

    assert_eq!(report.attempted(), 2);
    assert_eq!(report.skipped_count(), 1);
    let Outcome::Skipped { reason } = &report.records[0].outcome else {
        panic!("expected the reversal to be skipped");
    };
    assert!(reason.contains("protected"));
    assert!(report.records[1].solution().is_some());
}

#[test]
fn search_reports_serialize_for_downstream_consumers() {
    let ciphertext = ciphertext();
    let constraints = constraints();
    let report = SearchOrchestrator::new(scenario_space())
        .run(&ciphertext, &constraints)
        .unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let back: keywheel::SearchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(report, back);
    assert_eq!(back.closed_count(), 1);
}
