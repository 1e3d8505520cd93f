//! # keywheel - Key-Wheel Cipher Constraint Solver
//!
//! keywheel determines what a hypothesized classical cipher
//! configuration is forced to mean. Given a ciphertext, a set of
//! known-plaintext constraints (anchors, tails, hypotheses), and a
//! configuration — classing scheme, optional transposition route,
//! cipher family, period, phase — it forces key-wheel residues, detects
//! contradictions, derives every position the configuration determines,
//! and proves how far the result is from full closure.
//!
//! ## Core Concepts
//!
//! - **Wheel / slot**: a key-schedule equivalence class and its periodic
//!   position; a slot holds one residue shared by every position mapping
//!   to it
//! - **Forcing**: turning a known-plaintext constraint into a residue
//!   requirement at its slot; disagreements are recorded collisions,
//!   never silent overwrites
//! - **Closure**: the state in which every position has a determined
//!   plaintext value; the analyzer proves the minimum number of extra
//!   constraints needed to reach it
//! - **Search**: enumerating a Cartesian configuration space, one
//!   immutable record per attempted point
//!
//! ## Usage
//!
//! ```rust
//! use keywheel::{
//!     anchor, parse_text, ClassingScheme, Family, FamilyPlan, Solver,
//! };
//!
//! let ciphertext = parse_text("TGFVJUABCD").unwrap();
//! let constraints = anchor(0, "SECRET").unwrap();
//!
//! let solver = Solver::new(&ciphertext, &constraints);
//! let solution = solver
//!     .solve(
//!         None,
//!         ClassingScheme::Identity,
//!         &FamilyPlan::uniform(Family::Vigenere),
//!         5,
//!         0,
//!     )
//!     .unwrap();
//!
//! assert!(solution.is_feasible());
//! // Six constraints over period five force all five slots and
//! // therefore every position.
//! assert!(solution.is_closed());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod alphabet;
pub mod classing;
pub mod collision;
pub mod constraint;
pub mod error;
pub mod family;
pub mod route;
pub mod wheel;

// Pipeline: force, derive, analyze, search
pub mod closure;
pub mod derive;
pub mod forcer;
pub mod receipt;
pub mod search;

// Re-export primary types at crate root for convenience
pub use alphabet::{parse_text, render_partial, render_text, Letter, ALPHABET_LEN};
pub use classing::ClassingScheme;
pub use closure::ClosureReport;
pub use collision::{CollisionEvent, IllegalResidueEvent, Infeasibility, ResidueRejection};
pub use constraint::{anchor, span, tail, Constraint, Provenance};
pub use derive::{derive, derive_autokey, encrypt, Autokey, Derivation};
pub use error::{ConfigError, ConstraintError, RouteError, SolverError, SolverResult};
pub use family::{Family, Tableau};
pub use forcer::{ForceEffect, Forcer, ForcingPolicy, ForcingSummary};
pub use receipt::Receipt;
pub use route::{Route, RouteDescriptor};
pub use search::{
    Combination, Outcome, Phases, SearchOrchestrator, SearchRecord, SearchReport, SearchSpace,
    SearchSpaceBuilder, Solution, Solver,
};
pub use wheel::{FamilyPlan, Slot, SlotSource, Wheel, WheelBank, WheelConfig};
