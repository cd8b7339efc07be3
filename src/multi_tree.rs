//! Multi-tree outer iteration driver.
//!
//! Classic decomposition loop: solve the master problem, harvest candidate
//! points, generate hyperplanes from them, and re-solve the augmented master
//! until a termination predicate fires.

use crate::backend::{MasterBackend, MasterSolutionStatus};
use crate::bounds::{
    DualCandidate, DualSolutionSource, PrimalCandidate, PrimalSolutionSource,
};
use crate::cuts::{create_integer_cut, HyperplaneLog, HyperplaneSelector, IntegerCut};
use crate::env::Environment;
use crate::error::DualResult;
use crate::model::{ProblemModel, SolutionPoint};
use crate::relaxation::RelaxationStrategy;
use crate::repair::repair_infeasibility;

/// Why the outer loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Absolute objective gap tolerance met.
    AbsoluteGap,

    /// Relative objective gap tolerance met.
    RelativeGap,

    /// Outer iteration limit reached.
    IterationLimit,

    /// Wall-clock time limit reached.
    TimeLimit,

    /// Master problem infeasible and repair failed.
    InfeasibleMaster,

    /// Master relaxation unbounded even after the objective workaround.
    UnboundedMaster,

    /// No further cut could be generated; the loop cannot progress.
    NoCutsAdded,

    /// A backend error ended the run.
    Error,
}

/// Final outcome of a multi-tree solve.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Why the loop stopped.
    pub termination: TerminationReason,

    /// Number of outer iterations performed.
    pub iterations: u64,

    /// Final dual bound.
    pub dual_bound: f64,

    /// Final primal bound.
    pub primal_bound: f64,

    /// Best feasible point, if one was found.
    pub primal_solution: Option<Vec<f64>>,
}

/// Multi-tree iteration driver.
pub struct DualLoopController<'a> {
    env: &'a Environment,
    model: &'a dyn ProblemModel,
    backend: &'a mut dyn MasterBackend,
    selector: HyperplaneSelector,
    log: HyperplaneLog,
    relaxation: RelaxationStrategy,
    repairs_performed: u64,
    has_discrete_variables: bool,
}

impl<'a> DualLoopController<'a> {
    /// Create the controller; picks the hyperplane selector from the
    /// settings and applies the initial relaxation state to the backend.
    pub fn new(
        env: &'a Environment,
        model: &'a dyn ProblemModel,
        backend: &'a mut dyn MasterBackend,
    ) -> Self {
        let selector = HyperplaneSelector::from_settings(&env.settings);
        let relaxation = RelaxationStrategy::new(env, backend);
        let has_discrete_variables = !model.discrete_variable_indexes().is_empty();

        Self {
            env,
            model,
            backend,
            selector,
            log: HyperplaneLog::new(),
            relaxation,
            repairs_performed: 0,
            has_discrete_variables,
        }
    }

    /// Supply the interior point used by the ESH selector.
    pub fn set_interior_point(&mut self, point: Vec<f64>) {
        self.selector.set_interior_point(point);
    }

    /// Hyperplanes generated so far.
    pub fn hyperplane_log(&self) -> &HyperplaneLog {
        &self.log
    }

    /// Run the outer loop to termination.
    pub fn run(&mut self) -> SolveOutcome {
        loop {
            let kind = self.relaxation.problem_kind(self.backend);
            let iter_num = {
                let mut ledger = self.env.ledger();
                ledger.create_iteration(kind, self.env.bounds.bounds())
            };
            self.log.begin_iteration(iter_num);

            self.relaxation.execute(self.env, self.backend);

            let status = match self.solve_master() {
                Ok(status) => status,
                Err(e) => {
                    log::error!("Master solve failed: {}", e);
                    return self.outcome(TerminationReason::Error);
                }
            };

            if let Some(iter) = self.env.ledger().current_mut() {
                iter.solution_status = Some(status);
            }

            match status {
                MasterSolutionStatus::Infeasible => {
                    if self.try_repair() {
                        continue;
                    }
                    return self.outcome(TerminationReason::InfeasibleMaster);
                }
                MasterSolutionStatus::Unbounded => {
                    return self.outcome(TerminationReason::UnboundedMaster);
                }
                MasterSolutionStatus::Abort | MasterSolutionStatus::Error => {
                    return self.outcome(TerminationReason::Error);
                }
                _ => {}
            }

            let points = match self.collect_candidate_points(iter_num) {
                Ok(points) => points,
                Err(e) => {
                    log::error!("Failed to read master solution: {}", e);
                    return self.outcome(TerminationReason::Error);
                }
            };

            if points.is_empty() {
                log::error!("Master reported solvable status but no solution points");
                return self.outcome(TerminationReason::Error);
            }

            self.record_iteration_point(&points[0]);
            self.submit_bound_candidates(status, &points, iter_num);
            self.log_progress(iter_num, &points[0]);

            if let Some(reason) = self.check_termination() {
                return self.outcome(reason);
            }

            // A strictly interior point improves later ESH root searches
            if points[0].max_deviation.value < 0.0 {
                self.selector.set_interior_point(points[0].point.clone());
            }

            let cuts_added = {
                let mut ledger = self.env.ledger();
                self.selector.run(
                    self.env,
                    self.model,
                    self.backend,
                    &mut self.log,
                    &mut ledger,
                    &points,
                    false,
                )
            };

            let integer_cuts_added = self.add_integer_cuts(&points);

            if cuts_added == 0 && integer_cuts_added == 0 {
                return self.outcome(TerminationReason::NoCutsAdded);
            }
        }
    }

    /// Solve the master, applying the unbounded-objective workaround when
    /// needed.
    fn solve_master(&mut self) -> DualResult<MasterSolutionStatus> {
        let status = self.backend.solve()?;

        if status != MasterSolutionStatus::Unbounded {
            return Ok(status);
        }

        // Temporarily drop the offending objective terms, re-solve, restore
        log::debug!("Master relaxation unbounded, retrying without unbounded objective terms");
        self.backend.remove_unbounded_objective_terms()?;
        let retry = self.backend.solve();
        self.backend.restore_objective_terms()?;

        retry
    }

    fn try_repair(&mut self) -> bool {
        if !self.env.settings.repair_enabled {
            return false;
        }
        if self.repairs_performed >= self.env.settings.repair_iteration_limit {
            log::debug!("Infeasibility repair budget exhausted");
            return false;
        }

        self.repairs_performed += 1;
        let mut ledger = self.env.ledger();
        match repair_infeasibility(self.backend, &mut self.log, &mut ledger) {
            Ok(repaired) => repaired,
            Err(e) => {
                log::error!("Infeasibility repair failed: {}", e);
                false
            }
        }
    }

    fn collect_candidate_points(&self, iter_num: u64) -> DualResult<Vec<SolutionPoint>> {
        let count = self
            .backend
            .number_of_solutions()
            .min(self.env.settings.max_solutions_per_iteration);

        let mut points = Vec::with_capacity(count);
        for idx in 0..count {
            let point = self.backend.variable_solution(idx)?;
            points.push(SolutionPoint::evaluate(self.model, point, iter_num));
        }
        Ok(points)
    }

    fn record_iteration_point(&self, representative: &SolutionPoint) {
        if let Some(iter) = self.env.ledger().current_mut() {
            iter.objective_value = representative.objective_value;
            iter.max_deviation = Some(representative.max_deviation);
        }
    }

    fn submit_bound_candidates(
        &self,
        status: MasterSolutionStatus,
        points: &[SolutionPoint],
        iter_num: u64,
    ) {
        let discrete = self.backend.discrete_variables_active();

        // The master optimum bounds the MINLP optimum from the relaxed side
        let dual_objective = if status == MasterSolutionStatus::Optimal {
            self.backend.objective_value(0).unwrap_or_else(|_| self.backend.dual_objective_value())
        } else {
            self.backend.dual_objective_value()
        };

        let source = if discrete {
            DualSolutionSource::MipSolutionOptimal
        } else {
            DualSolutionSource::LpSolutionOptimal
        };

        self.env.bounds.submit_dual(&DualCandidate {
            objective: dual_objective,
            point: points[0].point.clone(),
            source,
            iter_found: iter_num,
        });

        // Only discrete-feasible points qualify as primal candidates
        if !discrete && self.has_discrete_variables {
            return;
        }

        for point in points {
            if point.is_feasible(self.env.settings.term_tolerance) {
                self.env.bounds.submit_primal(&PrimalCandidate {
                    solution: point.clone(),
                    source: PrimalSolutionSource::MipSolutionOptimal,
                });
            }
        }
    }

    fn check_termination(&self) -> Option<TerminationReason> {
        let settings = &self.env.settings;

        if self.env.bounds.is_absolute_gap_met(settings.absolute_gap_tolerance) {
            return Some(TerminationReason::AbsoluteGap);
        }
        if self.env.bounds.is_relative_gap_met(settings.relative_gap_tolerance) {
            return Some(TerminationReason::RelativeGap);
        }
        if self.env.is_iteration_limit_reached() {
            return Some(TerminationReason::IterationLimit);
        }
        if self.env.is_time_limit_reached() {
            return Some(TerminationReason::TimeLimit);
        }

        None
    }

    fn add_integer_cuts(&mut self, points: &[SolutionPoint]) -> usize {
        if !self.env.settings.add_integer_cuts
            || !self.has_discrete_variables
            || !self.backend.discrete_variables_active()
        {
            return 0;
        }

        let representative = &points[0];
        if representative.is_feasible(self.env.settings.term_tolerance) {
            return 0;
        }

        let cut = IntegerCut::from_point(self.model, &representative.point);
        match create_integer_cut(self.model, self.backend, &self.env.settings, &cut) {
            Ok(true) => {
                self.env.ledger().count_integer_cuts(1);
                1
            }
            Ok(false) => 0,
            Err(e) => {
                log::error!("Failed to add integer cut: {}", e);
                0
            }
        }
    }

    fn log_progress(&self, iter_num: u64, representative: &SolutionPoint) {
        let (dual, primal) = self.env.bounds.bounds();
        log::info!(
            "Iter {:4} | obj {:12.6e} | maxdev {:10.4e} | bounds [{:.6e}, {:.6e}] | cuts {}",
            iter_num,
            representative.objective_value,
            representative.max_deviation.value,
            dual,
            primal,
            self.log.len(),
        );
    }

    fn outcome(&self, termination: TerminationReason) -> SolveOutcome {
        let (dual_bound, primal_bound) = self.env.bounds.bounds();
        SolveOutcome {
            termination,
            iterations: self.env.ledger().len() as u64,
            dual_bound,
            primal_bound,
            primal_solution: self.env.bounds.primal_solution(),
        }
    }
}
