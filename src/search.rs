//! Combination enumeration and the per-combination solve pipeline.
//!
//! The orchestrator walks a Cartesian space of routes, classing
//! schemes, family plans, periods, and phases, running the full
//! force → derive → analyze pipeline once per point. Every attempted
//! point yields exactly one [`SearchRecord`] — feasible, infeasible, or
//! skipped — so downstream summarization can always compute pass/fail
//! counts. Points share no mutable state; the parallel driver produces
//! the same record sequence as the sequential one, bit for bit.

use serde::{Deserialize, Serialize};

use crate::alphabet::Letter;
use crate::classing::ClassingScheme;
use crate::closure::{analyze, ClosureReport};
use crate::collision::Infeasibility;
use crate::constraint::{positions_with, validate_all, Constraint, Provenance};
use crate::derive::{derive, derive_autokey, Autokey, Derivation};
use crate::error::{ConfigError, SolverError, SolverResult};
use crate::forcer::{Forcer, ForcingPolicy};
use crate::receipt::Receipt;
use crate::route::Route;
use crate::wheel::{FamilyPlan, WheelBank};

/// Per-combination solver over fixed ciphertext and constraints.
#[derive(Debug, Clone, Copy)]
pub struct Solver<'a> {
    ciphertext: &'a [Letter],
    constraints: &'a [Constraint],
    policy: ForcingPolicy,
    autokey: Option<Autokey>,
}

impl<'a> Solver<'a> {
    /// Creates a solver with the permissive policy and no autokey.
    #[must_use]
    pub const fn new(ciphertext: &'a [Letter], constraints: &'a [Constraint]) -> Self {
        Self {
            ciphertext,
            constraints,
            policy: ForcingPolicy::permissive(),
            autokey: None,
        }
    }

    /// Sets the residue-validation policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ForcingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enables autokey/running-key feedback during derivation.
    #[must_use]
    pub const fn with_autokey(mut self, autokey: Autokey) -> Self {
        self.autokey = Some(autokey);
        self
    }

    /// Runs force → derive → analyze for one combination.
    ///
    /// An infeasible combination is not an error: its rejections are
    /// returned inside the [`Solution`] and its plaintext stays all
    /// unknown (a contradictory bank derives nothing).
    ///
    /// # Errors
    ///
    /// Returns constraint errors (malformed input) and configuration
    /// errors (bad period/phase/plan).
    pub fn solve(
        &self,
        route: Option<&Route>,
        classing: ClassingScheme,
        plan: &FamilyPlan,
        period: usize,
        phase: usize,
    ) -> SolverResult<Solution> {
        let mut bank = WheelBank::uniform(classing, self.ciphertext.len(), plan, period, phase)?;
        let mut forcer = Forcer::new(&mut bank, self.ciphertext, route, self.policy)?;
        let summary = forcer.force_all(self.constraints)?;

        let derivation = if summary.is_feasible() {
            match self.autokey {
                Some(autokey) => derive_autokey(&bank, self.ciphertext, route, autokey)?,
                None => derive(&bank, self.ciphertext, route)?,
            }
        } else {
            Derivation {
                plaintext: vec![None; self.ciphertext.len()],
                forced_count: 0,
                passes: 0,
            }
        };

        let closure = analyze(&bank, &derivation, route)?;
        Ok(Solution {
            wheel_bank: bank,
            derivation,
            infeasibilities: summary.infeasibilities,
            closure,
        })
    }
}

/// The terminal artifact of one combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// The forced wheel bank.
    pub wheel_bank: WheelBank,

    /// Derived plaintext with explicit unknowns, plus pass counts.
    pub derivation: Derivation,

    /// Every collision or illegal residue, in forcing order. Empty for
    /// a feasible combination.
    pub infeasibilities: Vec<Infeasibility>,

    /// Slot coverage and the provable closure bound.
    pub closure: ClosureReport,
}

impl Solution {
    /// True when no constraint was rejected.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.infeasibilities.is_empty()
    }

    /// True when every position is determined.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closure.closure
    }

    /// Number of determined positions.
    #[must_use]
    pub fn forced_count(&self) -> usize {
        self.derivation.forced_count
    }
}

/// One point of the enumerated space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    /// Route identifier, or `None` for no transposition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,

    /// Classing scheme.
    pub classing: ClassingScheme,

    /// Family assignment.
    pub families: FamilyPlan,

    /// Period length.
    pub period: usize,

    /// Phase offset.
    pub phase: usize,
}

impl Combination {
    /// Stable human-readable label.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "route={} classing={} families={} L={} phase={}",
            self.route_id.as_deref().unwrap_or("none"),
            self.classing,
            self.families.label(),
            self.period,
            self.phase
        )
    }
}

/// How one attempted combination ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The pipeline ran; the solution may still be infeasible.
    Solved {
        /// The combination's terminal artifact.
        solution: Solution,
    },

    /// The combination was rejected before any wheel work.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
}

/// One record per attempted combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    /// The attempted point.
    pub combination: Combination,

    /// What happened.
    pub outcome: Outcome,
}

impl SearchRecord {
    /// The solution, if the pipeline ran.
    #[must_use]
    pub fn solution(&self) -> Option<&Solution> {
        match &self.outcome {
            Outcome::Solved { solution } => Some(solution),
            Outcome::Skipped { .. } => None,
        }
    }

    /// True for a feasible, fully attempted combination.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.solution().is_some_and(Solution::is_feasible)
    }

    /// True when the combination reached full closure.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.solution().is_some_and(Solution::is_closed)
    }
}

/// Which phases to enumerate for each period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Phases {
    /// Every phase `0..L`.
    #[default]
    All,

    /// Only the listed phases.
    Explicit {
        /// Phases to attempt; one out of range for a period is skipped
        /// with a record, not an error.
        phases: Vec<usize>,
    },
}

impl Phases {
    fn for_period(&self, period: usize) -> Vec<usize> {
        match self {
            Self::All => (0..period).collect(),
            Self::Explicit { phases } => phases.clone(),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Explicit { phases } => format!("{phases:?}"),
        }
    }
}

/// The Cartesian space a search enumerates.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    routes: Vec<Option<Route>>,
    classings: Vec<ClassingScheme>,
    plans: Vec<FamilyPlan>,
    periods: Vec<usize>,
    phases: Phases,
    policy: ForcingPolicy,
    autokey: Option<Autokey>,
    na_only: bool,
    budget: Option<usize>,
}

impl SearchSpace {
    /// Starts building a space.
    #[must_use]
    pub fn builder() -> SearchSpaceBuilder {
        SearchSpaceBuilder::default()
    }

    /// The routes of the space, excluding the no-route point.
    #[must_use]
    pub fn routes(&self) -> Vec<&Route> {
        self.routes.iter().flatten().collect()
    }

    /// Deterministic description of the space, hashed into the receipt.
    #[must_use]
    pub fn recipe(&self) -> String {
        let routes: Vec<&str> = self
            .routes
            .iter()
            .map(|r| r.as_ref().map_or("none", |r| r.id()))
            .collect();
        let classings: Vec<String> = self.classings.iter().map(ToString::to_string).collect();
        let plans: Vec<String> = self.plans.iter().map(FamilyPlan::label).collect();
        format!(
            "routes={routes:?};classings={classings:?};families={plans:?};periods={periods:?};phases={phases};policy_no_identity={no_identity};autokey={autokey:?};na_only={na_only};budget={budget:?}",
            periods = self.periods,
            phases = self.phases.label(),
            no_identity = self.policy.forbid_identity_residue,
            autokey = self.autokey.map(|a| (a.delay, a.max_passes)),
            na_only = self.na_only,
            budget = self.budget,
        )
    }
}

/// Builder for [`SearchSpace`].
#[derive(Debug, Clone, Default)]
pub struct SearchSpaceBuilder {
    routes: Vec<Option<Route>>,
    classings: Vec<ClassingScheme>,
    plans: Vec<FamilyPlan>,
    periods: Vec<usize>,
    phases: Option<Phases>,
    policy: ForcingPolicy,
    autokey: Option<Autokey>,
    na_only: bool,
    budget: Option<usize>,
}

impl SearchSpaceBuilder {
    /// Adds a transposition route.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(Some(route));
        self
    }

    /// Adds the no-transposition point. Implied when no route is added.
    #[must_use]
    pub fn without_route(mut self) -> Self {
        self.routes.push(None);
        self
    }

    /// Adds a classing scheme.
    #[must_use]
    pub fn classing(mut self, classing: ClassingScheme) -> Self {
        self.classings.push(classing);
        self
    }

    /// Adds a family plan.
    #[must_use]
    pub fn plan(mut self, plan: FamilyPlan) -> Self {
        self.plans.push(plan);
        self
    }

    /// Adds a period.
    #[must_use]
    pub fn period(mut self, period: usize) -> Self {
        self.periods.push(period);
        self
    }

    /// Adds several periods.
    #[must_use]
    pub fn periods(mut self, periods: impl IntoIterator<Item = usize>) -> Self {
        self.periods.extend(periods);
        self
    }

    /// Sets the phase policy. Defaults to every phase `0..L`.
    #[must_use]
    pub fn phases(mut self, phases: Phases) -> Self {
        self.phases = Some(phases);
        self
    }

    /// Sets the residue-validation policy.
    #[must_use]
    pub fn policy(mut self, policy: ForcingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enables autokey feedback for every combination.
    #[must_use]
    pub fn autokey(mut self, autokey: Autokey) -> Self {
        self.autokey = Some(autokey);
        self
    }

    /// Requires routes to leave anchor positions untouched.
    #[must_use]
    pub fn na_only(mut self) -> Self {
        self.na_only = true;
        self
    }

    /// Caps the number of attempted combinations.
    #[must_use]
    pub fn budget(mut self, budget: usize) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Finishes the space.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptySearchDimension` when no classing,
    /// plan, or period was supplied.
    pub fn build(self) -> Result<SearchSpace, ConfigError> {
        if self.classings.is_empty() {
            return Err(ConfigError::EmptySearchDimension {
                dimension: "classings",
            });
        }
        if self.plans.is_empty() {
            return Err(ConfigError::EmptySearchDimension { dimension: "plans" });
        }
        if self.periods.is_empty() {
            return Err(ConfigError::EmptySearchDimension {
                dimension: "periods",
            });
        }
        let routes = if self.routes.is_empty() {
            vec![None]
        } else {
            self.routes
        };
        Ok(SearchSpace {
            routes,
            classings: self.classings,
            plans: self.plans,
            periods: self.periods,
            phases: self.phases.unwrap_or_default(),
            policy: self.policy,
            autokey: self.autokey,
            na_only: self.na_only,
            budget: self.budget,
        })
    }
}

/// A finished search: receipt plus one record per attempted point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Names the inputs the search ran against.
    pub receipt: Receipt,

    /// Records in enumeration order.
    pub records: Vec<SearchRecord>,
}

impl SearchReport {
    /// Number of attempted combinations.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.records.len()
    }

    /// Number of feasible combinations.
    #[must_use]
    pub fn feasible_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_feasible()).count()
    }

    /// Number of combinations reaching full closure.
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_closed()).count()
    }

    /// Number of combinations skipped before wheel work.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Skipped { .. }))
            .count()
    }
}

struct ComboRef<'a> {
    route: Option<&'a Route>,
    classing: ClassingScheme,
    plan: &'a FamilyPlan,
    period: usize,
    phase: usize,
}

impl ComboRef<'_> {
    fn to_combination(&self) -> Combination {
        Combination {
            route_id: self.route.map(|r| r.id().to_string()),
            classing: self.classing,
            families: self.plan.clone(),
            period: self.period,
            phase: self.phase,
        }
    }
}

/// Enumerates a [`SearchSpace`] and collects one record per point.
#[derive(Debug, Clone)]
pub struct SearchOrchestrator {
    space: SearchSpace,
}

impl SearchOrchestrator {
    /// Creates an orchestrator over a space.
    #[must_use]
    pub fn new(space: SearchSpace) -> Self {
        Self { space }
    }

    /// Runs the search sequentially.
    ///
    /// # Errors
    ///
    /// Returns a `ConstraintError` for a malformed constraint set —
    /// before any combination is attempted. Infeasible combinations are
    /// not errors.
    pub fn run(
        &self,
        ciphertext: &[Letter],
        constraints: &[Constraint],
    ) -> SolverResult<SearchReport> {
        let (combos, protected, solver) = self.prepare(ciphertext, constraints)?;
        let records = combos
            .iter()
            .map(|combo| self.attempt(&solver, &protected, combo))
            .collect::<SolverResult<Vec<_>>>()?;
        self.finish(ciphertext, records)
    }

    /// Runs the search on a fixed pool of worker threads.
    ///
    /// Combinations share no mutable state, so the enumeration is
    /// embarrassingly parallel; records are reassembled in enumeration
    /// order and the report is bit-identical to the sequential one.
    ///
    /// # Errors
    ///
    /// Same contract as [`SearchOrchestrator::run`].
    pub fn run_parallel(
        &self,
        ciphertext: &[Letter],
        constraints: &[Constraint],
        workers: usize,
    ) -> SolverResult<SearchReport> {
        let (combos, protected, solver) = self.prepare(ciphertext, constraints)?;
        let workers = workers.max(1).min(combos.len().max(1));

        let (task_tx, task_rx) = crossbeam_channel::bounded(combos.len().max(1));
        let (record_tx, record_rx) = crossbeam_channel::bounded(combos.len().max(1));

        let mut slots: Vec<Option<SolverResult<SearchRecord>>> = Vec::new();
        slots.resize_with(combos.len(), || None);

        std::thread::scope(|scope| {
            for (index, combo) in combos.iter().enumerate() {
                // Bounded to the combination count, so sends cannot block.
                let _ = task_tx.send((index, combo));
            }
            drop(task_tx);

            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let record_tx = record_tx.clone();
                let protected = &protected;
                let solver = &solver;
                scope.spawn(move || {
                    while let Ok((index, combo)) = task_rx.recv() {
                        let record = self.attempt(solver, protected, combo);
                        let _ = record_tx.send((index, record));
                    }
                });
            }
            drop(record_tx);

            while let Ok((index, record)) = record_rx.recv() {
                slots[index] = Some(record);
            }
        });

        let mut records = Vec::with_capacity(slots.len());
        for slot in slots {
            // Every task was sent and every worker drains its queue, so
            // a missing slot cannot happen; surface it as an error
            // rather than panicking if it ever does.
            let record = slot.ok_or_else(|| {
                SolverError::serialization("parallel search lost a combination record")
            })??;
            records.push(record);
        }
        self.finish(ciphertext, records)
    }

    fn prepare<'a>(
        &'a self,
        ciphertext: &'a [Letter],
        constraints: &'a [Constraint],
    ) -> SolverResult<(
        Vec<ComboRef<'a>>,
        std::collections::BTreeSet<usize>,
        Solver<'a>,
    )> {
        validate_all(constraints, ciphertext.len())?;

        let protected = if self.space.na_only {
            positions_with(constraints, Provenance::Anchor)
        } else {
            std::collections::BTreeSet::new()
        };

        let mut solver = Solver::new(ciphertext, constraints).with_policy(self.space.policy);
        if let Some(autokey) = self.space.autokey {
            solver = solver.with_autokey(autokey);
        }

        let mut combos = Vec::new();
        'enumerate: for route in &self.space.routes {
            for &classing in &self.space.classings {
                for plan in &self.space.plans {
                    for &period in &self.space.periods {
                        for phase in self.space.phases.for_period(period) {
                            if let Some(budget) = self.space.budget {
                                if combos.len() >= budget {
                                    break 'enumerate;
                                }
                            }
                            combos.push(ComboRef {
                                route: route.as_ref(),
                                classing,
                                plan,
                                period,
                                phase,
                            });
                        }
                    }
                }
            }
        }
        Ok((combos, protected, solver))
    }

    fn attempt(
        &self,
        solver: &Solver<'_>,
        protected: &std::collections::BTreeSet<usize>,
        combo: &ComboRef<'_>,
    ) -> SolverResult<SearchRecord> {
        let combination = combo.to_combination();

        if self.space.na_only {
            if let Some(route) = combo.route {
                if let Err(err) = route.require_fixed(protected) {
                    return Ok(SearchRecord {
                        combination,
                        outcome: Outcome::Skipped {
                            reason: err.to_string(),
                        },
                    });
                }
            }
        }

        match solver.solve(combo.route, combo.classing, combo.plan, combo.period, combo.phase) {
            Ok(solution) => Ok(SearchRecord {
                combination,
                outcome: Outcome::Solved { solution },
            }),
            // A plan or phase that does not fit this particular point is
            // a skipped point, not a failed search.
            Err(SolverError::Config(
                err @ (ConfigError::FamilyPlanMismatch { .. }
                | ConfigError::PhaseOutOfRange { .. }
                | ConfigError::ZeroPeriod),
            )) => Ok(SearchRecord {
                combination,
                outcome: Outcome::Skipped {
                    reason: err.to_string(),
                },
            }),
            Err(err) => Err(err),
        }
    }

    fn finish(
        &self,
        ciphertext: &[Letter],
        records: Vec<SearchRecord>,
    ) -> SolverResult<SearchReport> {
        let routes: Vec<Route> = self
            .space
            .routes
            .iter()
            .flatten()
            .cloned()
            .collect();
        let receipt = Receipt::new(ciphertext, &routes, self.space.recipe())?;
        Ok(SearchReport { receipt, records })
    }
}
