//! Hyperplane and cut generation.
//!
//! A [`Hyperplane`] is a request: a generating point plus the constraint to
//! linearize. Realizing it produces a [`GeneratedHyperplane`], the actual
//! linear cut registered with the master backend and retained for possible
//! infeasibility repair.

mod ecp;
mod esh;
mod integer;
mod rootsearch;

pub use ecp::SolutionPointSelector;
pub use esh::RootsearchSelector;
pub use integer::{create_integer_cut, IntegerCut};
pub use rootsearch::bisection;

use std::collections::HashSet;

use crate::backend::{MasterBackend, RowSense};
use crate::env::Environment;
use crate::ledger::IterationLedger;
use crate::model::{ProblemModel, SolutionPoint};
use crate::settings::{CutStrategy, DualSettings};

/// Origin of a hyperplane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HyperplaneSource {
    /// Linearized directly at a master solution point.
    OriginalSolution,

    /// Linearized at a point found by the interior root search.
    InteriorPointSearch,

    /// Linearized at a rounded relaxation solution.
    RoundedRelaxation,
}

/// A hyperplane request: where to linearize and why.
///
/// `source_constraint` is `None` when the generating search used the joint
/// max-function over all constraints rather than a single one; the realized
/// cut then linearizes whichever constraint attains the maximum at the
/// generated point.
#[derive(Debug, Clone)]
pub struct Hyperplane {
    /// Source constraint, or `None` for the joint max-function.
    pub source_constraint: Option<usize>,

    /// Point at which the constraint is linearized.
    pub generated_point: Vec<f64>,

    /// Origin of the request.
    pub source: HyperplaneSource,
}

/// A realized linear cut: `terms . x <= -constant`.
#[derive(Debug, Clone)]
pub struct GeneratedHyperplane {
    /// Sparse linear terms `(variable index, coefficient)`.
    pub terms: Vec<(usize, f64)>,

    /// Constant part; the registered row is `terms . x <= -constant`.
    pub constant: f64,

    /// Source constraint of the request.
    pub source_constraint: Option<usize>,

    /// Origin of the request.
    pub source: HyperplaneSource,

    /// Iteration in which the cut was generated.
    pub generated_iter: u64,

    /// Row index in the master problem, `None` for lazy cuts.
    pub row_index: Option<usize>,

    /// Whether the cut was added as a lazy constraint.
    pub is_lazy: bool,

    /// Set when an infeasibility repair invalidated the cut.
    pub is_removed: bool,
}

impl GeneratedHyperplane {
    /// Flag the cut as invalidated by a repair step.
    pub fn mark_removed(&mut self) {
        self.is_removed = true;
    }
}

/// Compute the linear terms of a hyperplane request.
///
/// Linearizes `g(x) <= 0` at the generated point `p`:
/// `g(p) + grad(p) . (x - p) <= 0`, returned as `(terms, constant)` with the
/// cut convention `terms . x <= -constant`. Returns `None` when the gradient
/// or constant is numerically degenerate (non-finite); the caller skips the
/// cut instead of aborting.
pub fn build_hyperplane_terms(
    model: &dyn ProblemModel,
    hyperplane: &Hyperplane,
) -> Option<(Vec<(usize, f64)>, f64)> {
    let point = &hyperplane.generated_point;

    let constraint = match hyperplane.source_constraint {
        Some(idx) => idx,
        None => model.most_deviating_constraint(point).constraint,
    };

    let value = model.constraint_value(constraint, point);
    let terms = model.constraint_gradient(constraint, point);

    // constant = g(p) - grad . p, so that terms . x <= -constant
    let mut constant = value;
    for &(idx, coefficient) in &terms {
        if !coefficient.is_finite() {
            log::warn!(
                "Hyperplane not generated, non-finite coefficient in linear terms (constraint {})",
                constraint
            );
            return None;
        }
        constant -= coefficient * point[idx];
    }

    if !constant.is_finite() {
        log::warn!(
            "Hyperplane not generated, non-finite constant term (constraint {})",
            constraint
        );
        return None;
    }

    if terms.iter().all(|&(_, c)| c.abs() <= 1e-12) {
        log::warn!(
            "Hyperplane not generated, zero gradient (constraint {})",
            constraint
        );
        return None;
    }

    Some((terms, constant))
}

/// Outcome of registering one hyperplane request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Cut added to the master problem.
    Added,

    /// Skipped: non-finite linear terms.
    RejectedNonFinite,

    /// Skipped: per-iteration hyperplane cap reached.
    CapReached,

    /// Skipped: a cut for this constraint was already added this iteration.
    DuplicateConstraint,
}

/// Running log of realized hyperplanes for one solve.
#[derive(Debug, Default)]
pub struct HyperplaneLog {
    generated: Vec<GeneratedHyperplane>,
    current_iter: u64,
    added_this_iter: usize,
    constraints_this_iter: HashSet<usize>,
}

impl HyperplaneLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-iteration cap and uniqueness state.
    pub fn begin_iteration(&mut self, iter: u64) {
        if iter != self.current_iter {
            self.current_iter = iter;
            self.added_this_iter = 0;
            self.constraints_this_iter.clear();
        }
    }

    /// Realize a hyperplane request and register the cut with the backend.
    ///
    /// The request is consumed; on success the generated cut is retained in
    /// the log (flagged `is_lazy` when added through the lazy interface).
    /// Backend failures are logged and reported as [`RegisterOutcome`] skips,
    /// never propagated.
    pub fn register(
        &mut self,
        settings: &DualSettings,
        model: &dyn ProblemModel,
        backend: &mut dyn MasterBackend,
        hyperplane: Hyperplane,
        lazy: bool,
    ) -> RegisterOutcome {
        if self.added_this_iter >= settings.max_hyperplanes_per_iteration {
            return RegisterOutcome::CapReached;
        }

        if settings.unique_constraints {
            if let Some(constraint) = hyperplane.source_constraint {
                if self.constraints_this_iter.contains(&constraint) {
                    return RegisterOutcome::DuplicateConstraint;
                }
            }
        }

        let (terms, constant) = match build_hyperplane_terms(model, &hyperplane) {
            Some(pair) => pair,
            None => return RegisterOutcome::RejectedNonFinite,
        };

        let rhs = -constant;
        let row_index = if lazy {
            match backend.add_lazy_constraint(&terms, rhs) {
                Ok(()) => None,
                Err(e) => {
                    log::error!("Failed to add lazy hyperplane: {}", e);
                    return RegisterOutcome::RejectedNonFinite;
                }
            }
        } else {
            match backend.add_linear_constraint(&terms, rhs, RowSense::Le, true) {
                Ok(row) => Some(row),
                Err(e) => {
                    log::error!("Failed to add hyperplane: {}", e);
                    return RegisterOutcome::RejectedNonFinite;
                }
            }
        };

        if let Some(constraint) = hyperplane.source_constraint {
            self.constraints_this_iter.insert(constraint);
        }
        self.added_this_iter += 1;

        self.generated.push(GeneratedHyperplane {
            terms,
            constant,
            source_constraint: hyperplane.source_constraint,
            source: hyperplane.source,
            generated_iter: self.current_iter,
            row_index,
            is_lazy: lazy,
            is_removed: false,
        });

        RegisterOutcome::Added
    }

    /// All generated hyperplanes.
    pub fn generated(&self) -> &[GeneratedHyperplane] {
        &self.generated
    }

    /// Mutable access for the repair step.
    pub fn generated_mut(&mut self) -> &mut [GeneratedHyperplane] {
        &mut self.generated
    }

    /// Number of generated hyperplanes.
    pub fn len(&self) -> usize {
        self.generated.len()
    }

    /// Whether no hyperplane has been generated yet.
    pub fn is_empty(&self) -> bool {
        self.generated.is_empty()
    }
}

/// Hyperplane selection strategy, picked once from configuration.
#[derive(Debug)]
pub enum HyperplaneSelector {
    /// Solution-based (ECP) selection.
    Solution(SolutionPointSelector),

    /// Line-search-based (ESH) selection.
    Rootsearch(RootsearchSelector),
}

impl HyperplaneSelector {
    /// Construct the selector configured by the settings.
    pub fn from_settings(settings: &DualSettings) -> Self {
        match settings.cut_strategy {
            CutStrategy::Ecp => HyperplaneSelector::Solution(SolutionPointSelector::new()),
            CutStrategy::Esh => HyperplaneSelector::Rootsearch(RootsearchSelector::new(
                settings.rootsearch_constraint_strategy,
            )),
        }
    }

    /// Supply the interior point used by the ESH root search. A no-op for the
    /// ECP variant.
    pub fn set_interior_point(&mut self, point: Vec<f64>) {
        if let HyperplaneSelector::Rootsearch(selector) = self {
            selector.set_interior_point(point);
        }
    }

    /// Select hyperplane requests from the candidate points and register the
    /// resulting cuts. Returns the number of cuts added, counted into the
    /// ledger.
    pub fn run(
        &mut self,
        env: &Environment,
        model: &dyn ProblemModel,
        backend: &mut dyn MasterBackend,
        log: &mut HyperplaneLog,
        ledger: &mut IterationLedger,
        candidates: &[SolutionPoint],
        lazy: bool,
    ) -> usize {
        let added = match self {
            HyperplaneSelector::Solution(selector) => {
                selector.run(&env.settings, model, backend, log, candidates, lazy)
            }
            HyperplaneSelector::Rootsearch(selector) => {
                selector.run(&env.settings, model, backend, log, candidates, lazy)
            }
        };

        ledger.count_hyperplanes(added);
        added
    }
}
