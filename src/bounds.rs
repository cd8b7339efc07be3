//! Global dual/primal bound tracking.
//!
//! Callback threads of the external branch-and-cut engine may submit bound
//! candidates concurrently; all updates go through one mutex and are applied
//! only if they strictly improve the respective bound for the problem's
//! optimization sense. Stale or worse candidates are dropped silently.

use std::sync::{Mutex, PoisonError};

use crate::model::SolutionPoint;

/// Where a dual bound candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualSolutionSource {
    /// Optimal solve of the discrete master problem.
    MipSolutionOptimal,

    /// Optimal solve of the continuous relaxation.
    LpSolutionOptimal,

    /// Feasibility bound reported by the MILP engine mid-search.
    MilpSolutionFeasible,
}

/// Where a primal bound candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimalSolutionSource {
    /// Feasible point from an optimal master solve.
    MipSolutionOptimal,

    /// Incumbent reported through the lazy-constraint callback.
    LazyConstraintCallback,

    /// Point found by a line search toward the feasible region.
    LineSearch,

    /// Point polished by a fixed-integer NLP solve.
    FixedNlp,

    /// Rounded solution of a continuous relaxation.
    RoundedRelaxation,
}

/// A dual bound candidate.
#[derive(Debug, Clone)]
pub struct DualCandidate {
    /// Bound value.
    pub objective: f64,

    /// Associated point, possibly empty when only a bound is known.
    pub point: Vec<f64>,

    /// Origin of the candidate.
    pub source: DualSolutionSource,

    /// Iteration in which the candidate was discovered.
    pub iter_found: u64,
}

/// A primal bound candidate.
#[derive(Debug, Clone)]
pub struct PrimalCandidate {
    /// The feasible point.
    pub solution: SolutionPoint,

    /// Origin of the candidate.
    pub source: PrimalSolutionSource,
}

#[derive(Debug)]
struct BoundState {
    dual_bound: f64,
    primal_bound: f64,
    primal_solution: Option<Vec<f64>>,
}

/// Monotone tracker for the global `(dualBound, primalBound)` pair.
#[derive(Debug)]
pub struct BoundTracker {
    is_minimization: bool,
    state: Mutex<BoundState>,
}

impl BoundTracker {
    /// Create a tracker with infinite initial bounds for the given sense.
    pub fn new(is_minimization: bool) -> Self {
        let state = if is_minimization {
            BoundState {
                dual_bound: f64::NEG_INFINITY,
                primal_bound: f64::INFINITY,
                primal_solution: None,
            }
        } else {
            BoundState {
                dual_bound: f64::INFINITY,
                primal_bound: f64::NEG_INFINITY,
                primal_solution: None,
            }
        };
        Self {
            is_minimization,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoundState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit a dual bound candidate. Returns whether the bound improved.
    pub fn submit_dual(&self, candidate: &DualCandidate) -> bool {
        if !candidate.objective.is_finite() {
            return false;
        }

        let mut state = self.lock();
        let improves = if self.is_minimization {
            candidate.objective > state.dual_bound
        } else {
            candidate.objective < state.dual_bound
        };

        if improves {
            state.dual_bound = candidate.objective;
            log::debug!(
                "Dual bound improved to {:.6e} ({:?}, iteration {})",
                candidate.objective,
                candidate.source,
                candidate.iter_found
            );
        }

        improves
    }

    /// Submit a primal bound candidate. Returns whether the bound improved.
    pub fn submit_primal(&self, candidate: &PrimalCandidate) -> bool {
        let objective = candidate.solution.objective_value;
        if !objective.is_finite() {
            return false;
        }

        let mut state = self.lock();
        let improves = if self.is_minimization {
            objective < state.primal_bound
        } else {
            objective > state.primal_bound
        };

        if improves {
            state.primal_bound = objective;
            state.primal_solution = Some(candidate.solution.point.clone());
            log::info!(
                "New primal bound {:.6e} ({:?}, iteration {})",
                objective,
                candidate.source,
                candidate.solution.iter_found
            );
        }

        improves
    }

    /// Current dual bound.
    pub fn dual_bound(&self) -> f64 {
        self.lock().dual_bound
    }

    /// Current primal bound.
    pub fn primal_bound(&self) -> f64 {
        self.lock().primal_bound
    }

    /// Current `(dualBound, primalBound)` pair, read atomically.
    pub fn bounds(&self) -> (f64, f64) {
        let state = self.lock();
        (state.dual_bound, state.primal_bound)
    }

    /// Best known feasible point, if any.
    pub fn primal_solution(&self) -> Option<Vec<f64>> {
        self.lock().primal_solution.clone()
    }

    /// Absolute objective gap `|primal - dual|`.
    pub fn absolute_gap(&self) -> f64 {
        let (dual, primal) = self.bounds();
        if dual.is_infinite() || primal.is_infinite() {
            return f64::INFINITY;
        }
        (primal - dual).abs()
    }

    /// Relative objective gap `|primal - dual| / max(|primal|, eps)`.
    pub fn relative_gap(&self) -> f64 {
        let (dual, primal) = self.bounds();
        if dual.is_infinite() || primal.is_infinite() {
            return f64::INFINITY;
        }
        (primal - dual).abs() / primal.abs().max(1e-10)
    }

    /// Whether the absolute gap is within `tol`.
    pub fn is_absolute_gap_met(&self, tol: f64) -> bool {
        self.absolute_gap() <= tol
    }

    /// Whether the relative gap is within `tol`.
    pub fn is_relative_gap_met(&self, tol: f64) -> bool {
        self.relative_gap() <= tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaxDeviation;
    use std::sync::Arc;

    fn dual(value: f64) -> DualCandidate {
        DualCandidate {
            objective: value,
            point: Vec::new(),
            source: DualSolutionSource::MilpSolutionFeasible,
            iter_found: 0,
        }
    }

    fn primal(value: f64) -> PrimalCandidate {
        PrimalCandidate {
            solution: SolutionPoint {
                point: vec![value],
                objective_value: value,
                max_deviation: MaxDeviation {
                    constraint: 0,
                    value: 0.0,
                },
                iter_found: 0,
            },
            source: PrimalSolutionSource::MipSolutionOptimal,
        }
    }

    #[test]
    fn test_monotone_dual_updates() {
        let tracker = BoundTracker::new(true);

        assert!(tracker.submit_dual(&dual(1.0)));
        assert!(!tracker.submit_dual(&dual(0.5))); // Worse, dropped
        assert!(tracker.submit_dual(&dual(2.0)));
        assert_eq!(tracker.dual_bound(), 2.0);
    }

    #[test]
    fn test_monotone_primal_updates() {
        let tracker = BoundTracker::new(true);

        assert!(tracker.submit_primal(&primal(10.0)));
        assert!(!tracker.submit_primal(&primal(15.0))); // Worse, dropped
        assert!(tracker.submit_primal(&primal(5.0)));
        assert_eq!(tracker.primal_bound(), 5.0);
        assert_eq!(tracker.primal_solution(), Some(vec![5.0]));
    }

    #[test]
    fn test_maximization_sense() {
        let tracker = BoundTracker::new(false);

        assert!(tracker.submit_dual(&dual(10.0)));
        assert!(tracker.submit_dual(&dual(8.0))); // Dual shrinks toward optimum
        assert!(!tracker.submit_dual(&dual(9.0)));

        assert!(tracker.submit_primal(&primal(1.0)));
        assert!(tracker.submit_primal(&primal(3.0)));
        assert!(!tracker.submit_primal(&primal(2.0)));
    }

    #[test]
    fn test_non_finite_candidates_rejected() {
        let tracker = BoundTracker::new(true);

        assert!(!tracker.submit_dual(&dual(f64::NAN)));
        assert!(!tracker.submit_primal(&primal(f64::INFINITY)));
        assert_eq!(tracker.dual_bound(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_gap_computation() {
        let tracker = BoundTracker::new(true);
        assert!(tracker.absolute_gap().is_infinite());

        tracker.submit_dual(&dual(8.0));
        tracker.submit_primal(&primal(10.0));

        assert!((tracker.absolute_gap() - 2.0).abs() < 1e-12);
        assert!((tracker.relative_gap() - 0.2).abs() < 1e-12);
        assert!(tracker.is_absolute_gap_met(2.5));
        assert!(!tracker.is_relative_gap_met(0.1));
    }

    #[test]
    fn test_concurrent_submissions_stay_monotone() {
        let tracker = Arc::new(BoundTracker::new(true));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let v = (t * 100 + i) as f64 / 100.0;
                        tracker.submit_dual(&dual(v));
                        tracker.submit_primal(&primal(100.0 - v));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Best submitted values regardless of interleaving
        assert_eq!(tracker.dual_bound(), 7.99);
        assert_eq!(tracker.primal_bound(), 100.0 - 7.99);
    }
}
