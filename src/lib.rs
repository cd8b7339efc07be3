//! Hyperplane-based dual decomposition engine for convex MINLP
//!
//! This library implements the dual (bound-improving) side of a
//! polyhedral outer approximation solver for convex mixed-integer nonlinear
//! programs. The nonlinear feasible region is approximated by an iteratively
//! refined set of supporting hyperplanes; the resulting linear master problem
//! is solved by an external MIP engine reached through a backend trait.
//!
//! # Algorithm
//!
//! Two cut-generation strategies are available:
//!
//! - **ESH (extended supporting hyperplane)**: a root search along the
//!   segment from a known interior point to the candidate finds the boundary
//!   of the feasible region, and the cut is generated there. The cuts are
//!   supporting hyperplanes, so no feasible point is ever cut off.
//! - **ECP (extended cutting plane)**: the cut is generated directly at the
//!   candidate point. No interior point is needed.
//!
//! Both run in one of two modes:
//!
//! - **Multi-tree** ([`DualLoopController`]): the master problem is re-solved
//!   from scratch in every outer iteration, with an initial cheap phase on
//!   the continuous relaxation governed by [`RelaxationStrategy`].
//! - **Single-tree** ([`LazyConstraintHandler`]): the master problem is
//!   solved once and cuts are injected as lazy constraints from inside the
//!   branch-and-cut search via callback events.
//!
//! Supporting machinery includes monotone dual/primal bound tracking safe to
//! use from callback threads ([`BoundTracker`]), no-good cuts excluding
//! rejected discrete assignments, and repair of master problems made
//! infeasible by accumulated cuts.
//!
//! # Example
//!
//! ```ignore
//! use solver_minlp::{DualLoopController, DualSettings, Environment};
//!
//! let settings = DualSettings::default();
//! let env = Environment::new(settings, model.is_minimization());
//!
//! let mut controller = DualLoopController::new(&env, &model, &mut backend);
//! let outcome = controller.run();
//!
//! println!("Terminated: {:?}", outcome.termination);
//! println!("Bounds: [{}, {}]", outcome.dual_bound, outcome.primal_bound);
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod bounds;
pub mod cuts;
pub mod env;
pub mod error;
pub mod ledger;
pub mod model;
pub mod multi_tree;
pub mod relaxation;
pub mod repair;
pub mod settings;
pub mod single_tree;
pub mod timing;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use backend::{MasterBackend, MasterSolutionStatus, NlpBackend, NlpSolutionStatus, RowSense};
pub use bounds::{
    BoundTracker, DualCandidate, DualSolutionSource, PrimalCandidate, PrimalSolutionSource,
};
pub use cuts::{
    GeneratedHyperplane, Hyperplane, HyperplaneLog, HyperplaneSelector, HyperplaneSource,
    IntegerCut,
};
pub use env::Environment;
pub use error::{DualError, DualResult};
pub use ledger::{Iteration, IterationKind, IterationLedger};
pub use model::{MaxDeviation, ProblemModel, SolutionPoint};
pub use multi_tree::{DualLoopController, SolveOutcome, TerminationReason};
pub use relaxation::{RelaxationState, RelaxationStrategy};
pub use settings::{CutStrategy, DualSettings, RootsearchConstraintStrategy};
pub use single_tree::{CallbackAction, CallbackEvent, CallbackStats, LazyConstraintHandler};
