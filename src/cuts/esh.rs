//! Line-search-based hyperplane selection (ESH).
//!
//! Instead of linearizing at the (exterior) candidate point, searches along
//! the segment from a known interior point to the candidate for the crossing
//! of the nonlinear boundary and linearizes there, yielding supporting
//! hyperplanes of the feasible region.

use super::ecp::select_violated_constraints;
use super::rootsearch::bisection;
use super::{Hyperplane, HyperplaneLog, HyperplaneSource, RegisterOutcome};
use crate::backend::MasterBackend;
use crate::model::{ProblemModel, SolutionPoint};
use crate::settings::{DualSettings, RootsearchConstraintStrategy};

fn interpolate(interior: &[f64], exterior: &[f64], t: f64) -> Vec<f64> {
    interior
        .iter()
        .zip(exterior.iter())
        .map(|(&a, &b)| a + t * (b - a))
        .collect()
}

/// Statistics for the root-search selector.
#[derive(Debug, Default, Clone)]
pub struct RootsearchStats {
    /// Hyperplanes added.
    pub cuts_added: usize,

    /// Candidates handled without an interior point (fallback to ECP).
    pub fallback_cuts: usize,

    /// Root searches that failed to bracket a crossing.
    pub failed_searches: usize,
}

/// Line-search-based (ESH) hyperplane selector.
#[derive(Debug)]
pub struct RootsearchSelector {
    strategy: RootsearchConstraintStrategy,
    interior_point: Option<Vec<f64>>,
    stats: RootsearchStats,
}

impl RootsearchSelector {
    /// Create the selector with the given constraint strategy.
    pub fn new(strategy: RootsearchConstraintStrategy) -> Self {
        Self {
            strategy,
            interior_point: None,
            stats: RootsearchStats::default(),
        }
    }

    /// Supply the interior point the root search starts from.
    pub fn set_interior_point(&mut self, point: Vec<f64>) {
        self.interior_point = Some(point);
    }

    /// Whether an interior point is available.
    pub fn has_interior_point(&self) -> bool {
        self.interior_point.is_some()
    }

    /// Generate hyperplanes for the candidate points. Returns the number of
    /// cuts added.
    pub fn run(
        &mut self,
        settings: &DualSettings,
        model: &dyn ProblemModel,
        backend: &mut dyn MasterBackend,
        log: &mut HyperplaneLog,
        candidates: &[SolutionPoint],
        lazy: bool,
    ) -> usize {
        let mut added = 0;

        for candidate in candidates {
            if candidate.max_deviation.value < settings.term_tolerance {
                continue;
            }

            let outcome = match self.interior_point.clone() {
                Some(interior) => match self.strategy {
                    RootsearchConstraintStrategy::AllAsMaxFunction => self.run_max_function(
                        settings, model, backend, log, &interior, candidate, lazy,
                    ),
                    RootsearchConstraintStrategy::IndividualConstraints => self.run_individual(
                        settings, model, backend, log, &interior, candidate, lazy,
                    ),
                },
                None => {
                    // No interior point known yet; fall back to linearizing
                    // at the candidate itself
                    self.stats.fallback_cuts += 1;
                    let hyperplane = Hyperplane {
                        source_constraint: Some(candidate.max_deviation.constraint),
                        generated_point: candidate.point.clone(),
                        source: HyperplaneSource::OriginalSolution,
                    };
                    match log.register(settings, model, backend, hyperplane, lazy) {
                        RegisterOutcome::Added => 1,
                        RegisterOutcome::CapReached => {
                            self.stats.cuts_added += added;
                            return added;
                        }
                        _ => 0,
                    }
                }
            };

            added += outcome;
        }

        self.stats.cuts_added += added;
        added
    }

    /// One root search on the max-function over all nonlinear constraints.
    #[allow(clippy::too_many_arguments)]
    fn run_max_function(
        &mut self,
        settings: &DualSettings,
        model: &dyn ProblemModel,
        backend: &mut dyn MasterBackend,
        log: &mut HyperplaneLog,
        interior: &[f64],
        candidate: &SolutionPoint,
        lazy: bool,
    ) -> usize {
        let max_violation =
            |t: f64| model.most_deviating_constraint(&interpolate(interior, &candidate.point, t)).value;

        let bracket = bisection(
            max_violation,
            0.0,
            1.0,
            settings.rootsearch_max_iterations,
            settings.rootsearch_termination_tolerance,
        );

        let (_, exterior_t) = match bracket {
            Some(pair) => pair,
            None => {
                self.stats.failed_searches += 1;
                log::debug!("Max-function root search failed to bracket the boundary");
                return 0;
            }
        };

        let boundary_point = interpolate(interior, &candidate.point, exterior_t);

        let hyperplane = Hyperplane {
            // The max-function has no single source constraint; the realized
            // cut linearizes whichever constraint is active at the boundary
            source_constraint: None,
            generated_point: boundary_point,
            source: HyperplaneSource::InteriorPointSearch,
        };

        match log.register(settings, model, backend, hyperplane, lazy) {
            RegisterOutcome::Added => 1,
            _ => 0,
        }
    }

    /// A separate root search per violated constraint.
    #[allow(clippy::too_many_arguments)]
    fn run_individual(
        &mut self,
        settings: &DualSettings,
        model: &dyn ProblemModel,
        backend: &mut dyn MasterBackend,
        log: &mut HyperplaneLog,
        interior: &[f64],
        candidate: &SolutionPoint,
        lazy: bool,
    ) -> usize {
        let mut added = 0;

        for (constraint, _) in select_violated_constraints(settings, model, &candidate.point) {
            let violation =
                |t: f64| model.constraint_value(constraint, &interpolate(interior, &candidate.point, t));

            let bracket = bisection(
                violation,
                0.0,
                1.0,
                settings.rootsearch_max_iterations,
                settings.rootsearch_termination_tolerance,
            );

            let (_, exterior_t) = match bracket {
                Some(pair) => pair,
                None => {
                    self.stats.failed_searches += 1;
                    continue;
                }
            };

            let hyperplane = Hyperplane {
                source_constraint: Some(constraint),
                generated_point: interpolate(interior, &candidate.point, exterior_t),
                source: HyperplaneSource::InteriorPointSearch,
            };

            match log.register(settings, model, backend, hyperplane, lazy) {
                RegisterOutcome::Added => added += 1,
                RegisterOutcome::CapReached => return added,
                _ => {}
            }
        }

        added
    }

    /// Statistics for this selector.
    pub fn stats(&self) -> &RootsearchStats {
        &self.stats
    }
}
