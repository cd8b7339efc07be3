//! Single-tree callback handling.
//!
//! In single-tree mode the discrete master problem is solved once; the
//! branch-and-cut engine calls back into the handler whenever it finds an
//! incumbent or solves a relaxed node, and violated candidates are cut off
//! with lazy constraints inside the running search. The handler runs on the
//! engine's callback threads: it never panics across the boundary, and every
//! backend failure degrades to skipping the cut.

use crate::backend::{MasterBackend, MasterSolutionStatus, NlpBackend, NlpSolutionStatus};
use crate::bounds::{
    DualCandidate, DualSolutionSource, PrimalCandidate, PrimalSolutionSource,
};
use crate::cuts::{HyperplaneLog, HyperplaneSelector};
use crate::env::Environment;
use crate::ledger::IterationKind;
use crate::model::{ProblemModel, SolutionPoint};

/// Event reported by the branch-and-cut engine.
#[derive(Debug, Clone)]
pub enum CallbackEvent {
    /// A new integer-feasible incumbent of the master problem.
    NewIncumbent {
        /// The incumbent point.
        point: Vec<f64>,

        /// Master objective value of the incumbent.
        objective: f64,

        /// Best dual bound of the tree search at this event.
        dual_bound: f64,
    },

    /// The engine's dual bound improved without a new incumbent.
    DualBoundImproved {
        /// The improved bound.
        bound: f64,
    },

    /// A relaxed (fractional) node solution became available.
    RelaxedNodeSolved {
        /// The node solution point.
        point: Vec<f64>,
    },

    /// The engine is shutting down.
    Terminate,
}

/// What the engine should do after the callback returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Keep searching.
    Continue,

    /// Abort the tree search.
    Abort,
}

/// Counters for the callback handler.
#[derive(Debug, Default, Clone)]
pub struct CallbackStats {
    /// Incumbent events handled.
    pub incumbents_handled: u64,

    /// Fixed-integer NLP solves performed.
    pub nlp_solves: u64,
}

/// Lazy-constraint callback handler.
///
/// Incumbents are pushed back to the engine (with a tightened cutoff) only
/// when the primal bound strictly improved on the last pushed value, so the
/// same solution is never suggested twice.
pub struct LazyConstraintHandler<'a> {
    env: &'a Environment,
    model: &'a dyn ProblemModel,
    selector: HyperplaneSelector,
    log: HyperplaneLog,
    nlp: Option<&'a mut dyn NlpBackend>,
    last_pushed_primal: f64,
    is_minimization: bool,
    stats: CallbackStats,
}

impl<'a> LazyConstraintHandler<'a> {
    /// Create a handler for one tree search.
    pub fn new(env: &'a Environment, model: &'a dyn ProblemModel) -> Self {
        let is_minimization = model.is_minimization();
        Self {
            env,
            model,
            selector: HyperplaneSelector::from_settings(&env.settings),
            log: HyperplaneLog::new(),
            nlp: None,
            last_pushed_primal: if is_minimization {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            },
            is_minimization,
            stats: CallbackStats::default(),
        }
    }

    /// Attach the NLP backend used for fixed-integer primal improvement.
    pub fn with_nlp_backend(mut self, nlp: &'a mut dyn NlpBackend) -> Self {
        self.nlp = Some(nlp);
        self
    }

    /// Supply the interior point used by the ESH selector.
    pub fn set_interior_point(&mut self, point: Vec<f64>) {
        self.selector.set_interior_point(point);
    }

    /// Hyperplanes generated so far.
    pub fn hyperplane_log(&self) -> &HyperplaneLog {
        &self.log
    }

    /// Handler counters.
    pub fn stats(&self) -> &CallbackStats {
        &self.stats
    }

    /// Process one callback event.
    pub fn handle(
        &mut self,
        backend: &mut dyn MasterBackend,
        event: CallbackEvent,
    ) -> CallbackAction {
        if let CallbackEvent::Terminate = event {
            return CallbackAction::Abort;
        }

        if self.should_terminate() {
            return CallbackAction::Abort;
        }

        match event {
            CallbackEvent::NewIncumbent {
                point,
                objective,
                dual_bound,
            } => self.on_incumbent(backend, point, objective, dual_bound),
            CallbackEvent::DualBoundImproved { bound } => self.on_dual_bound(bound),
            CallbackEvent::RelaxedNodeSolved { point } => self.on_relaxed_node(backend, point),
            CallbackEvent::Terminate => return CallbackAction::Abort,
        }

        CallbackAction::Continue
    }

    fn should_terminate(&self) -> bool {
        self.env.is_gap_met()
            || self.env.is_iteration_limit_reached()
            || self.env.is_time_limit_reached()
    }

    fn on_dual_bound(&mut self, bound: f64) {
        let iter_found = self.current_iteration_number();
        self.env.bounds.submit_dual(&DualCandidate {
            objective: bound,
            point: Vec::new(),
            source: DualSolutionSource::MilpSolutionFeasible,
            iter_found,
        });
    }

    fn on_incumbent(
        &mut self,
        backend: &mut dyn MasterBackend,
        point: Vec<f64>,
        objective: f64,
        dual_bound: f64,
    ) {
        self.stats.incumbents_handled += 1;

        let iter_num = {
            let mut ledger = self.env.ledger();
            ledger.create_iteration(IterationKind::DiscreteMaster, self.env.bounds.bounds())
        };
        self.log.begin_iteration(iter_num);

        let candidate = SolutionPoint::evaluate(self.model, point, iter_num);

        {
            let mut ledger = self.env.ledger();
            if let Some(iter) = ledger.current_mut() {
                iter.solution_status = Some(MasterSolutionStatus::Feasible);
                iter.objective_value = objective;
                iter.max_deviation = Some(candidate.max_deviation);
            }
        }

        self.env.bounds.submit_dual(&DualCandidate {
            objective: dual_bound,
            point: Vec::new(),
            source: DualSolutionSource::MilpSolutionFeasible,
            iter_found: iter_num,
        });

        if candidate.is_feasible(self.env.settings.term_tolerance) {
            self.env.bounds.submit_primal(&PrimalCandidate {
                solution: candidate.clone(),
                source: PrimalSolutionSource::LazyConstraintCallback,
            });
        } else {
            let mut ledger = self.env.ledger();
            self.selector.run(
                self.env,
                self.model,
                backend,
                &mut self.log,
                &mut ledger,
                std::slice::from_ref(&candidate),
                true,
            );
        }

        if self.should_run_fixed_nlp(&candidate) {
            self.run_fixed_nlp(backend, &candidate, iter_num);
        }

        self.push_improved_incumbent(backend);
    }

    fn on_relaxed_node(&mut self, backend: &mut dyn MasterBackend, point: Vec<f64>) {
        if !self.env.settings.add_hyperplanes_for_relaxed_solutions {
            return;
        }

        let iter_found = self.current_iteration_number();
        let candidate = SolutionPoint::evaluate(self.model, point, iter_found);
        if candidate.max_deviation.value < self.env.settings.term_tolerance {
            return;
        }

        let mut ledger = self.env.ledger();
        self.selector.run(
            self.env,
            self.model,
            backend,
            &mut self.log,
            &mut ledger,
            std::slice::from_ref(&candidate),
            true,
        );
    }

    fn current_iteration_number(&self) -> u64 {
        self.env.ledger().current().map(|i| i.number).unwrap_or(0)
    }

    /// The fixed NLP runs at the configured frequency, and additionally for
    /// any incumbent that beats the current primal bound.
    fn should_run_fixed_nlp(&self, candidate: &SolutionPoint) -> bool {
        if !self.env.settings.use_fixed_nlp || self.nlp.is_none() {
            return false;
        }
        if self.model.discrete_variable_indexes().is_empty() {
            return false;
        }

        let frequency = self.env.settings.fixed_nlp_frequency.max(1);
        if (self.stats.incumbents_handled - 1) % frequency == 0 {
            return true;
        }

        let (_, primal) = self.env.bounds.bounds();
        if self.is_minimization {
            candidate.objective_value < primal
        } else {
            candidate.objective_value > primal
        }
    }

    /// Fix the discrete variables to the incumbent assignment and solve the
    /// remaining NLP to polish the continuous part.
    fn run_fixed_nlp(
        &mut self,
        backend: &mut dyn MasterBackend,
        candidate: &SolutionPoint,
        iter_num: u64,
    ) {
        let nlp = match self.nlp.as_deref_mut() {
            Some(nlp) => nlp,
            None => return,
        };

        let indexes = self.model.discrete_variable_indexes();
        let values: Vec<f64> = indexes.iter().map(|&i| candidate.point[i].round()).collect();
        let all_indexes: Vec<usize> = (0..self.model.num_variables()).collect();

        nlp.fix_variables(&indexes, &values);
        nlp.set_starting_point(&all_indexes, &candidate.point);

        self.stats.nlp_solves += 1;
        let status = nlp.solve_problem_instance();

        match status {
            NlpSolutionStatus::Optimal | NlpSolutionStatus::Feasible => {
                let solution = SolutionPoint::evaluate(self.model, nlp.solution(), iter_num);
                if solution.is_feasible(self.env.settings.term_tolerance) {
                    self.env.bounds.submit_primal(&PrimalCandidate {
                        solution,
                        source: PrimalSolutionSource::FixedNlp,
                    });
                }
            }
            NlpSolutionStatus::Infeasible => {
                // This discrete assignment admits no feasible continuous
                // part; forbid it for the rest of the search
                if self.env.settings.add_integer_cuts && self.model.all_discrete_binary() {
                    let mut terms = Vec::with_capacity(indexes.len());
                    let mut ones = 0i64;
                    for (&idx, &value) in indexes.iter().zip(&values) {
                        if value.round() as i64 == 1 {
                            terms.push((idx, 1.0));
                            ones += 1;
                        } else {
                            terms.push((idx, -1.0));
                        }
                    }

                    match backend.add_lazy_constraint(&terms, ones as f64 - 1.0) {
                        Ok(()) => self.env.ledger().count_integer_cuts(1),
                        Err(e) => log::error!("Failed to add integer cut from fixed NLP: {}", e),
                    }
                }
            }
            NlpSolutionStatus::IterationLimit | NlpSolutionStatus::Error => {
                log::debug!("Fixed NLP solve ended with status {:?}", status);
            }
        }

        nlp.unfix_variables();
    }

    /// Suggest the best feasible point back to the engine and tighten its
    /// cutoff, but only when the primal bound strictly improved on the last
    /// value pushed.
    fn push_improved_incumbent(&mut self, backend: &mut dyn MasterBackend) {
        let (_, primal) = self.env.bounds.bounds();
        if !primal.is_finite() {
            return;
        }

        let improved = if self.is_minimization {
            primal < self.last_pushed_primal
        } else {
            primal > self.last_pushed_primal
        };
        if !improved {
            return;
        }

        let point = match self.env.bounds.primal_solution() {
            Some(point) => point,
            None => return,
        };

        if let Err(e) = backend.push_incumbent(&point) {
            log::error!("Failed to push incumbent to the master backend: {}", e);
            return;
        }

        // The backend expects the cutoff for the minimized form
        let cutoff = if self.is_minimization { primal } else { -primal };
        backend.set_cutoff(cutoff);
        self.last_pushed_primal = primal;

        log::debug!("Pushed incumbent with objective {:.6e} to the master backend", primal);
    }
}
